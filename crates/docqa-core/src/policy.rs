//! Timeout + retry policy shared by the embedding and LLM call sites.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    /// Upper bound for a single attempt.
    pub timeout: Duration,
    /// Extra attempts after the first failure.
    pub retries: u32,
    /// Delay before the first retry; doubles for every further retry.
    pub backoff: Duration,
}

impl CallPolicy {
    pub fn new(timeout: Duration, retries: u32, backoff: Duration) -> Self {
        Self { timeout, retries, backoff }
    }

    pub fn from_millis(timeout_ms: u64, retries: u32, backoff_ms: u64) -> Self {
        Self::new(Duration::from_millis(timeout_ms), retries, Duration::from_millis(backoff_ms))
    }

    /// Same policy with the per-attempt timeout capped at `remaining`.
    pub fn capped(&self, remaining: Duration) -> Self {
        Self { timeout: self.timeout.min(remaining), ..*self }
    }

    /// Run `call` until it succeeds or the attempts are used up.
    pub async fn run<T, F, Fut>(&self, label: &str, mut call: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout {
                    after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                }),
            };
            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.retries => {
                    let delay = self.backoff.saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    warn!(call = label, attempt, error = %err, "provider call failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
