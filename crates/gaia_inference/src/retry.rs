//! Bounded retry for backend calls.
//!
//! A [`RetryPolicy`] holds the attempt budget, the fixed pause between
//! attempts and the predicate deciding whether an error is worth another
//! attempt. It knows nothing about HTTP, so it can be exercised with plain
//! closures.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use gaia_core::{Error, GenerationSettings, Result};

#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between two attempts.
    pub delay: Duration,
    is_retryable: fn(&Error) -> bool,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(10))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            is_retryable: Error::is_transient,
        }
    }

    pub fn from_settings(settings: &GenerationSettings) -> Self {
        Self::new(settings.max_attempts, settings.retry_delay)
    }

    /// Replaces the transient-error predicate.
    pub fn with_predicate(mut self, is_retryable: fn(&Error) -> bool) -> Self {
        self.is_retryable = is_retryable;
        self
    }

    pub fn is_retryable(&self, error: &Error) -> bool {
        (self.is_retryable)(error)
    }

    /// Runs `operation` until it succeeds, fails permanently or the budget
    /// is spent. The closure receives the 1-based attempt number.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(attempts = attempt, "Backend call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if self.is_retryable(&e) && attempt < self.max_attempts => {
                    tracing::warn!(
                        error = %e,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = self.delay.as_millis() as u64,
                        "Backend call failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if self.is_retryable(&e) {
                        tracing::error!(error = %e, attempts = attempt, "Backend call failed after all retry attempts");
                    } else {
                        tracing::error!(error = %e, "Backend call failed with non-retryable error");
                    }
                    return Err(e);
                }
            }
        }
    }
}
