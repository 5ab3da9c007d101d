//! Retry policy for transient request failures.

use crate::config::ClientConfig;
use crate::error::ClientError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each later one.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        RetryPolicy {
            max_retries: config.max_retries,
            backoff: config.retry_backoff(),
        }
    }

    pub fn none() -> Self {
        RetryPolicy {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based): backoff, 2x backoff, 4x backoff, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    /// Run `operation`, retrying transient errors (see [`ClientError::is_transient`]).
    pub async fn run<F, Fut, T>(&self, operation: F) -> Result<T, ClientError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let delay = self.delay_for(attempt);
                debug!(attempt, max_retries = self.max_retries, delay_ms = delay.as_millis() as u64, "retrying request");
                tokio::time::sleep(delay).await;
            }
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    warn!(attempt = attempt + 1, max_retries = self.max_retries, error = %e, "request failed, will retry");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
