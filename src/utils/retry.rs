//! Retry with exponential backoff
//!
//! The fetch scheduler wraps every page fetch and every interest extraction
//! in [`with_retry_if`]. Only failures the caller classifies as recoverable
//! are retried; the attempt count is reported back so it can be recorded on
//! a crawl error.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff policy
///
/// Attempt `n` (1-based) waits `base_delay_ms * 2^(n - 2)` before it runs,
/// capped at `max_delay_ms`; the first attempt never waits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,

    pub base_delay_ms: u64,

    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::with_delays(3, 500, 5_000)
    }
}

impl RetryConfig {
    pub fn with_delays(max_retries: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms,
        }
    }

    /// Total attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before the given 1-based attempt
    fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 1u64.checked_shl(attempt - 2).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms))
    }
}

/// Final result of a retried operation and the attempts it took
#[derive(Debug)]
pub struct Attempted<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

/// Run `operation` until it succeeds, fails with an error `recoverable`
/// rejects, or the attempts are spent
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    mut operation: F,
    recoverable: P,
) -> Attempted<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.max_attempts();
    let mut attempt = 1;

    loop {
        let delay = config.delay_before(attempt);
        if !delay.is_zero() {
            debug!(attempt, delay_ms = delay.as_millis() as u64, "Backing off");
            tokio::time::sleep(delay).await;
        }

        let error = match operation().await {
            Ok(value) => {
                return Attempted {
                    result: Ok(value),
                    attempts: attempt,
                }
            }
            Err(e) => e,
        };

        if !recoverable(&error) || attempt >= max_attempts {
            if attempt > 1 {
                warn!(attempts = attempt, error = %error, "Giving up after retries");
            }
            return Attempted {
                result: Err(error),
                attempts: attempt,
            };
        }

        debug!(attempt, max_attempts, error = %error, "Attempt failed, retrying");
        attempt += 1;
    }
}
