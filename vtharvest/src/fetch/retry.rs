//! Bounded retry with exponential backoff.

use std::time::Duration;

use tracing::warn;

use super::{FetchError, FetchOutcome, TileClient};

/// How often and how patiently a tile request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles each time.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wait before attempt `attempt + 1`, i.e. `base · 2^(attempt − 1)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }

    /// Fetches `url`, retrying timeouts and connect failures.
    pub async fn fetch<C: TileClient>(
        &self,
        client: &C,
        url: &str,
    ) -> Result<FetchOutcome, FetchError> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match client.fetch(url).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if e.is_retryable() => {
                    if attempt >= max_attempts {
                        return Err(FetchError::RetriesExhausted {
                            url: url.to_string(),
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }
                    let delay = self.delay_for(attempt);
                    warn!(
                        url = url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Tile request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
