//! Bounded fetch scheduler
//!
//! A fixed pool of worker tasks pulls [`CrawlJob`]s from a shared channel:
//!
//! ```text
//!   jobs ──▶ mpsc ──▶ worker 1..N ──▶ mpsc ──▶ collector ──▶ CrawlResult
//!                        │
//!                        └── Frontier (admission, link merge)
//! ```
//!
//! Each worker claims its job in the [`Frontier`] before fetching, so a URL
//! is fetched at most once per crawl and the budgets hold under concurrency.
//! `run` returns only after every worker and the collector have finished.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::crawler::classifier::LinkClassifier;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::{Absorbed, Admission, Frontier};
use crate::error::ClassifiedError;
use crate::llm::InterestExtractor;
use crate::models::{CrawlError, CrawlJob, CrawlResult, PageKind, PageUrl, ProfessorRecord};
use crate::parser::ProfileReader;
use crate::utils::error::{ExtractionError, FetchError};
use crate::utils::retry::{with_retry_if, Attempted, RetryConfig};

/// Caller-issued cancellation
///
/// Cloning shares the signal. Once tripped it stays tripped: no new jobs are
/// dispatched, in-flight jobs run to completion or timeout.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Receiver that observes the flag changing
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Wait until cancellation is requested
    pub async fn cancelled(&self) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so `wait_for` cannot fail here
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// What a worker reports for one job
#[derive(Debug)]
enum JobOutcome {
    /// Directory or pagination page classified and merged
    Listing {
        url: PageUrl,
        links: usize,
        absorbed: Absorbed,
    },
    /// Profile page turned into a record, possibly with an extraction error
    Profile {
        record: ProfessorRecord,
        error: Option<CrawlError>,
    },
    /// Profile-classified page that failed the professor check
    NotProfessor { url: PageUrl, confidence: f64 },
    /// Fetch failed after retries
    Failed(CrawlError),
    /// Not dispatched: duplicate or over budget
    Skipped { url: PageUrl, admission: Admission },
    /// Taken from the queue after cancellation, never started
    Cancelled { url: PageUrl },
}

/// Everything a worker needs, shared across the pool
struct JobContext {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn InterestExtractor>,
    classifier: LinkClassifier,
    reader: ProfileReader,
    min_professor_confidence: f64,
    frontier: Arc<Frontier>,
    retry: RetryConfig,
    request_timeout: Duration,
    cancel: CancelSignal,
}

impl JobContext {
    async fn fetch_once(&self, url: &PageUrl) -> Result<String, FetchError> {
        tokio::time::timeout(self.request_timeout, self.fetcher.fetch(url))
            .await
            .unwrap_or(Err(FetchError::Timeout))
    }

    async fn process(&self, job: CrawlJob) -> JobOutcome {
        match self.frontier.admit(&job) {
            Admission::Dispatch => {}
            admission => {
                return JobOutcome::Skipped {
                    url: job.url,
                    admission,
                };
            }
        }

        let Attempted { result, attempts } = with_retry_if(
            &self.retry,
            || self.fetch_once(&job.url),
            |e: &FetchError| e.is_recoverable(),
        )
        .await;

        let html = match result {
            Ok(html) => html,
            Err(e) => {
                return JobOutcome::Failed(CrawlError {
                    url: job.url,
                    page_kind: job.kind,
                    kind: e.category().into(),
                    message: e.to_string(),
                    attempts,
                });
            }
        };

        if job.kind.is_listing() {
            let links = self.classifier.classify(&job.url, &html);
            let absorbed = self.frontier.absorb(&job, &links);
            return JobOutcome::Listing {
                url: job.url,
                links: links.len(),
                absorbed,
            };
        }

        self.extract_profile(job, &html).await
    }

    async fn extract_profile(&self, job: CrawlJob, html: &str) -> JobOutcome {
        let page = self.reader.read(html);
        if page.confidence < self.min_professor_confidence {
            return JobOutcome::NotProfessor {
                url: job.url,
                confidence: page.confidence,
            };
        }

        let Attempted { result, attempts } = with_retry_if(
            &self.retry,
            || self.extractor.extract(&page.research_text),
            |e: &ExtractionError| e.is_recoverable(),
        )
        .await;

        let (interests, error) = match result {
            Ok(interests) => (interests, None),
            Err(e) => (
                Vec::new(),
                Some(CrawlError {
                    url: job.url.clone(),
                    page_kind: PageKind::Profile,
                    kind: e.category().into(),
                    message: e.to_string(),
                    attempts,
                }),
            ),
        };

        JobOutcome::Profile {
            record: ProfessorRecord {
                source_url: job.url,
                name: page.name,
                raw_interest_text: page.research_text,
                interests,
                confidence: page.confidence,
            },
            error,
        }
    }
}

/// Worker pool that fetches and processes crawl jobs
pub struct FetchScheduler {
    session_id: Uuid,
    seed: PageUrl,
    ctx: Arc<JobContext>,
}

impl FetchScheduler {
    /// Create a scheduler for one crawl session
    pub fn new(
        session_id: Uuid,
        seed: PageUrl,
        config: &Config,
        frontier: Arc<Frontier>,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn InterestExtractor>,
        cancel: CancelSignal,
    ) -> Self {
        let ctx = JobContext {
            fetcher,
            extractor,
            classifier: LinkClassifier::new(&config.classifier, seed.clone()),
            reader: ProfileReader::new(config.extractor.max_input_chars)
                .with_keywords(&config.classifier.professor_keywords),
            min_professor_confidence: config.classifier.min_professor_confidence,
            frontier,
            retry: config.retry(),
            request_timeout: config.request_timeout(),
            cancel,
        };

        Self {
            session_id,
            seed,
            ctx: Arc::new(ctx),
        }
    }

    /// Process `jobs` with at most `worker_count` fetches in flight
    ///
    /// Per-job failures are recorded in the result, never returned. The
    /// result's counters and walk state are read from the shared frontier
    /// after the pool drains.
    pub async fn run(&self, jobs: Vec<CrawlJob>, worker_count: usize) -> CrawlResult {
        let mut result = CrawlResult::new(self.session_id, self.seed.clone());
        if jobs.is_empty() {
            return self.finalize(result);
        }

        let workers = worker_count.clamp(1, jobs.len());
        tracing::info!(jobs = jobs.len(), workers, "Starting fetch batch");

        let (job_tx, job_rx) = mpsc::channel::<CrawlJob>(jobs.len());
        let (result_tx, mut result_rx) = mpsc::channel::<JobOutcome>(jobs.len());

        let handles = self.spawn_workers(workers, job_rx, result_tx);

        let collector: JoinHandle<CrawlResult> = tokio::spawn(
            async move {
                while let Some(outcome) = result_rx.recv().await {
                    record(&mut result, outcome);
                }
                result
            }
            .in_current_span(),
        );

        for job in jobs {
            if job_tx.send(job).await.is_err() {
                tracing::error!("Job channel closed before all jobs were queued");
                break;
            }
        }
        drop(job_tx);

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Fetch worker panicked");
            }
        }

        let result = match collector.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Result collector failed");
                CrawlResult::new(self.session_id, self.seed.clone())
            }
        };

        self.finalize(result)
    }

    fn finalize(&self, mut result: CrawlResult) -> CrawlResult {
        let snapshot = self.ctx.frontier.snapshot();
        result.directory_pages_visited = snapshot.directory_pages_visited;
        result.profile_links_found = snapshot.profile_links_found;
        result.walk_state = snapshot.walk_state;
        result.cancelled = self.ctx.cancel.is_cancelled();
        result.finished_at = Utc::now();

        tracing::info!(
            pages = result.directory_pages_visited,
            profiles = result.professors.len(),
            errors = result.errors.len(),
            cancelled = result.cancelled,
            "Fetch batch completed"
        );
        result
    }

    fn spawn_workers(
        &self,
        count: usize,
        job_rx: mpsc::Receiver<CrawlJob>,
        result_tx: mpsc::Sender<JobOutcome>,
    ) -> Vec<JoinHandle<()>> {
        let job_rx = Arc::new(tokio::sync::Mutex::new(job_rx));
        let mut handles = Vec::with_capacity(count);

        for worker_id in 0..count {
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();
            let ctx = Arc::clone(&self.ctx);

            let handle = tokio::spawn(
                async move {
                    loop {
                        let job = {
                            let mut rx = job_rx.lock().await;
                            rx.recv().await
                        };

                        let Some(job) = job else {
                            break;
                        };

                        let outcome = if ctx.cancel.is_cancelled() {
                            JobOutcome::Cancelled { url: job.url }
                        } else {
                            tracing::debug!(worker_id, url = %job.url, kind = %job.kind, "Processing job");
                            ctx.process(job).await
                        };

                        if result_tx.send(outcome).await.is_err() {
                            tracing::error!(worker_id, "Result channel closed");
                            break;
                        }
                    }

                    tracing::debug!(worker_id, "Fetch worker shutting down");
                }
                .in_current_span(),
            );

            handles.push(handle);
        }

        handles
    }
}

/// Fold one outcome into the batch result
fn record(result: &mut CrawlResult, outcome: JobOutcome) {
    match outcome {
        JobOutcome::Listing {
            url,
            links,
            absorbed,
        } => {
            tracing::debug!(
                url = %url,
                links,
                profiles_added = absorbed.profiles_added,
                profiles_dropped = absorbed.profiles_dropped,
                pagination_enqueued = absorbed.pagination_enqueued,
                "Directory page processed"
            );
        }
        JobOutcome::Profile { record, error } => {
            tracing::debug!(url = %record.source_url, interests = record.interests.len(), "Profile processed");
            if let Some(error) = error {
                tracing::warn!(url = %error.url, error = %error.message, "Interest extraction failed");
                result.errors.push(error);
            }
            result.professors.push(record);
        }
        JobOutcome::NotProfessor { url, confidence } => {
            tracing::debug!(url = %url, confidence, "Not a professor page");
            result.non_professor_pages.push(url);
        }
        JobOutcome::Failed(error) => {
            tracing::warn!(
                url = %error.url,
                kind = ?error.kind,
                attempts = error.attempts,
                error = %error.message,
                "Job failed"
            );
            result.errors.push(error);
        }
        JobOutcome::Skipped { url, admission } => {
            tracing::debug!(url = %url, ?admission, "Job skipped");
        }
        JobOutcome::Cancelled { url } => {
            tracing::debug!(url = %url, "Job dropped after cancellation");
        }
    }
}
