//! Pagination walker
//!
//! Walks a multi-page directory starting at the seed:
//!
//! ```text
//!   Start ──seed──▶ Walking ──frontier empty──▶ Exhausted
//!                      │
//!                      └──page budget cut──▶ BudgetReached
//! ```
//!
//! Each round drains the frontier's pending pagination pages into one
//! scheduler batch. Workers merge what they find back into the frontier,
//! which the next round picks up. A pagination link back to a page already
//! visited never re-enters the frontier, so symmetric or self-referential
//! "next" links cannot loop.

use std::sync::Arc;

use crate::crawler::frontier::Frontier;
use crate::crawler::scheduler::{CancelSignal, FetchScheduler};
use crate::error::{Error, Result};
use crate::models::{CrawlJob, CrawlResult, PageUrl};

/// Result of walking a directory
#[derive(Debug)]
pub struct Walk {
    /// Directory-phase result: counters, walk state and per-page errors
    pub result: CrawlResult,
    /// Profile candidates in discovery order, capped at the link budget
    pub profiles: Vec<CrawlJob>,
}

/// Drives the directory phase through the fetch scheduler
pub struct PaginationWalker<'a> {
    frontier: Arc<Frontier>,
    scheduler: &'a FetchScheduler,
    workers: usize,
    cancel: CancelSignal,
}

impl<'a> PaginationWalker<'a> {
    pub fn new(
        frontier: Arc<Frontier>,
        scheduler: &'a FetchScheduler,
        workers: usize,
        cancel: CancelSignal,
    ) -> Self {
        Self {
            frontier,
            scheduler,
            workers,
            cancel,
        }
    }

    /// Walk from `seed` until the frontier is exhausted, the page budget is
    /// spent or the crawl is cancelled
    ///
    /// # Errors
    ///
    /// Returns [`Error::FatalSeed`] when the seed page fails in the first
    /// round for any reason: transport errors after retries, or a response
    /// that is not a readable page. Every other page failure is recorded in
    /// the result.
    pub async fn walk(&self, seed: PageUrl, mut result: CrawlResult) -> Result<Walk> {
        self.frontier.start(CrawlJob::seed(seed.clone()));
        result.walk_state = self.frontier.snapshot().walk_state;

        let mut round = 0usize;
        loop {
            if self.cancel.is_cancelled() {
                tracing::info!(round, "Walk cancelled");
                break;
            }

            let batch = self.frontier.take_pending();
            if batch.is_empty() {
                break;
            }

            round += 1;
            tracing::debug!(round, pages = batch.len(), "Walking directory pages");

            let batch_result = self.scheduler.run(batch, self.workers).await;

            if round == 1 {
                if let Some(failure) = batch_result.errors.iter().find(|e| e.url == seed) {
                    tracing::error!(
                        url = %seed,
                        kind = ?failure.kind,
                        attempts = failure.attempts,
                        error = %failure.message,
                        "Seed page unreachable"
                    );
                    return Err(Error::FatalSeed {
                        url: seed.to_string(),
                        reason: failure.message.clone(),
                    });
                }
            }

            result.merge(batch_result);
        }

        result.walk_state = self.frontier.finish_walk(self.cancel.is_cancelled());
        result.cancelled |= self.cancel.is_cancelled();

        let profiles = self.frontier.profile_jobs();
        tracing::info!(
            pages = self.frontier.snapshot().directory_pages_visited,
            profiles = profiles.len(),
            state = ?result.walk_state,
            "Directory walk finished"
        );

        Ok(Walk { result, profiles })
    }
}
