use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::Result;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Bounded retry with exponential backoff for transient fetch failures.
///
/// Only errors for which [`crate::ProcessingError::is_retryable`] holds are
/// retried; everything else is returned on first sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Never less than 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            base_delay,
        }
    }

    /// Single attempt, no backoff.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before attempt `attempt + 1`, doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }

    pub async fn run<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation = operation_name, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        operation = operation_name,
                        attempt,
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, will retry after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
