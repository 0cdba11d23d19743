//! Faculty directory crawling
//!
//! This module wires the crawl together: a [`PaginationWalker`] walks the
//! seed directory through a [`FetchScheduler`], then the same scheduler
//! fetches every accumulated profile page and runs interest extraction.

pub mod classifier;
pub mod fetcher;
pub mod frontier;
pub mod pagination;
pub mod scheduler;
pub mod url;

pub use classifier::LinkClassifier;
pub use fetcher::{Fetcher, HttpFetcher};
pub use frontier::{Frontier, VisitedSet};
pub use pagination::{PaginationWalker, Walk};
pub use scheduler::{CancelSignal, FetchScheduler};

use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::llm::{HeuristicInterestExtractor, InterestExtractor, LlmInterestExtractor};
use crate::models::{CrawlResult, PageUrl};

/// Main crawler structure
pub struct Crawler {
    config: Config,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn InterestExtractor>,
    cancel: CancelSignal,
}

impl Crawler {
    /// Create a crawler with explicit collaborators
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid
    pub fn new(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn InterestExtractor>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            fetcher,
            extractor,
            cancel: CancelSignal::new(),
        })
    }

    /// Create a crawler with the HTTP fetcher and the configured extractor
    ///
    /// Uses the LLM extractor when an API key is configured, otherwise the
    /// heuristic one.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or an HTTP client
    /// cannot be built
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use profscout::config::Config;
    /// use profscout::crawler::Crawler;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let crawler = Crawler::from_config(Config::from_env()?)?;
    ///     let result = crawler.crawl("https://cs.example.edu/people").await?;
    ///     println!("{} professors", result.professors.len());
    ///     Ok(())
    /// }
    /// ```
    pub fn from_config(config: Config) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.crawler)?);

        let extractor: Arc<dyn InterestExtractor> = if config.extractor.api_key.is_some() {
            Arc::new(LlmInterestExtractor::new(config.extractor.clone())?)
        } else {
            tracing::warn!("No extraction API key configured, using heuristic interest extraction");
            Arc::new(HeuristicInterestExtractor::new())
        };

        Self::new(config, fetcher, extractor)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle for cancelling this crawler's runs from another task
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Stop dispatching new jobs; the running crawl returns its partial result
    ///
    /// Cancellation is permanent for this crawler.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Crawl a faculty directory starting at `seed`
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` for an invalid seed URL and `Error::FatalSeed`
    /// when the seed page cannot be fetched or read. All other failures are recorded in
    /// [`CrawlResult::errors`].
    pub async fn crawl(&self, seed: &str) -> Result<CrawlResult> {
        let seed = PageUrl::parse(seed)?;
        let session_id = Uuid::new_v4();
        let span = tracing::info_span!("crawl", %session_id, seed = %seed);

        self.crawl_session(session_id, seed).instrument(span).await
    }

    async fn crawl_session(&self, session_id: Uuid, seed: PageUrl) -> Result<CrawlResult> {
        let crawler = &self.config.crawler;
        let mut result = CrawlResult::new(session_id, seed.clone());

        if self.cancel.is_cancelled() {
            tracing::info!("Crawl cancelled before start");
            result.cancelled = true;
            return Ok(result);
        }

        tracing::info!(
            max_pages = crawler.max_pages,
            max_links = crawler.max_links,
            workers = crawler.workers,
            "Starting crawl"
        );

        let frontier = Arc::new(Frontier::new(crawler.max_pages, crawler.max_links));
        let scheduler = FetchScheduler::new(
            session_id,
            seed.clone(),
            &self.config,
            Arc::clone(&frontier),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.extractor),
            self.cancel.clone(),
        );

        let walker = PaginationWalker::new(
            Arc::clone(&frontier),
            &scheduler,
            crawler.workers,
            self.cancel.clone(),
        );
        let Walk {
            result: walked,
            profiles,
        } = walker.walk(seed, result).await?;
        result = walked;

        if !result.cancelled && !profiles.is_empty() {
            tracing::info!(profiles = profiles.len(), "Fetching profile pages");
            let profile_result = scheduler.run(profiles, crawler.workers).await;
            result.merge(profile_result);
        }

        result.cancelled |= self.cancel.is_cancelled();
        result.finished_at = chrono::Utc::now();

        tracing::info!(
            pages = result.directory_pages_visited,
            profile_links = result.profile_links_found,
            professors = result.professors.len(),
            errors = result.errors.len(),
            state = ?result.walk_state,
            cancelled = result.cancelled,
            "Crawl completed"
        );

        Ok(result)
    }
}
