//! Selector-wait retry policy.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use autorpa_protocols::{ProviderError, StepError};

/// How often and how patiently to wait for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub retry_count: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
    /// Timeout of each attempt.
    pub timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_count: 2,
            retry_delay: Duration::from_millis(1000),
            timeout_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    pub fn new(retry_count: u32, retry_delay_ms: u64, timeout_ms: u64) -> Self {
        Self {
            retry_count,
            retry_delay: Duration::from_millis(retry_delay_ms),
            timeout_ms,
        }
    }

    /// A single attempt with no retries.
    pub fn once(timeout_ms: u64) -> Self {
        Self {
            retry_count: 0,
            retry_delay: Duration::ZERO,
            timeout_ms,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    /// Run `operation` until it succeeds, fails permanently, or runs out of
    /// attempts. Returns the value and the 1-based attempt that produced it.
    ///
    /// Only transient provider errors are retried. Exhaustion yields
    /// [`StepError::RetriesExhausted`] naming `selector`.
    pub async fn run<F, Fut, T>(
        &self,
        selector: &str,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<(T, u32), StepError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let max_attempts = self.max_attempts();

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(StepError::Cancelled);
            }

            let error = match operation(attempt).await {
                Ok(value) => {
                    debug!("'{}' available on attempt {}/{}", selector, attempt, max_attempts);
                    return Ok((value, attempt));
                }
                Err(e) if !e.is_transient() => return Err(e.into()),
                Err(e) => e,
            };

            if attempt == max_attempts {
                return Err(StepError::RetriesExhausted {
                    selector: selector.to_string(),
                    attempts: attempt,
                    retry_count: self.retry_count,
                    last_error: error,
                });
            }

            warn!(
                "Waiting for '{}' failed (attempt {}/{}): {}, retrying in {:?}",
                selector, attempt, max_attempts, error, self.retry_delay
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(StepError::Cancelled),
                _ = sleep(self.retry_delay) => {}
            }
        }

        // retry_count + 1 is at least one attempt, so the loop always returns.
        Err(StepError::Cancelled)
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
