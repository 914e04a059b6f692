//! Retry policy for catalog calls.
//!
//! Implements bounded attempts with exponential backoff. Exhausting the
//! attempts is an explicit outcome, never a propagated error: the pipeline
//! prefers forward progress over failing on a single query or playlist.

use crate::catalog::CatalogError;
use crate::config::RetrySettings;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Retry policy implementing exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included.
    pub max_attempts: u32,
    /// Wait after the first failed attempt.
    pub base_delay: Duration,
    /// Cap for the computed (not server-requested) wait.
    pub max_backoff: Duration,
    /// Multiplier applied to the wait after each failure.
    pub backoff_factor: f64,
}

/// Result of running an operation under a [`RetryPolicy`].
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { attempts: u32, last_error: CatalogError },
}

impl RetryPolicy {
    /// Create a new RetryPolicy from configuration settings.
    pub fn new(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_retries.max(1),
            base_delay: settings.base_delay,
            max_backoff: settings.max_backoff,
            backoff_factor: settings.backoff_factor,
        }
    }

    /// Wait before the next attempt, after `failed_attempts` failures.
    ///
    /// `base_delay * factor^(failed_attempts - 1)`, capped at `max_backoff`.
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        let capped = secs.min(self.max_backoff.as_secs_f64()).max(0.0);
        Duration::from_secs_f64(capped)
    }

    /// Wait after failed attempt `attempt`. A server-requested wait can
    /// extend the computed backoff but never beyond `max_backoff`.
    pub fn wait_after(&self, error: &CatalogError, attempt: u32) -> Duration {
        let backoff = self.backoff(attempt);
        match error.retry_after() {
            Some(hint) => hint.min(self.max_backoff).max(backoff),
            None => backoff,
        }
    }

    /// Whether a call that just failed with `error` on attempt `attempt`
    /// (1-based) should be attempted again.
    pub fn should_retry(&self, error: &CatalogError, attempt: u32) -> bool {
        error.is_retryable() && attempt < self.max_attempts
    }

    /// Run `call` until it succeeds, fails with a non-retryable error, or
    /// the attempts are used up.
    ///
    /// `operation` is only used for logging.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match call().await {
                Ok(value) => {
                    return RetryOutcome::Succeeded {
                        value,
                        attempts: attempt,
                    }
                }
                Err(e) if self.should_retry(&e, attempt) => {
                    let wait = self.wait_after(&e, attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        wait_secs = wait.as_secs_f64(),
                        "Catalog call failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    error!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        retryable = e.is_retryable(),
                        "Catalog call failed, giving up: {}",
                        e
                    );
                    return RetryOutcome::Exhausted {
                        attempts: attempt,
                        last_error: e,
                    };
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetrySettings::default())
    }
}
