//! Shared retry and backoff behavior for provider clients
//!
//! Every provider call runs through [`invoke_with_retry`]: errors whose
//! message matches one of the transient indicators are retried with
//! exponential backoff, everything else returns immediately. The workflow
//! layer never retries; this is the only place retries happen.

use crate::llm::LlmError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Message substrings that classify a provider error as transient.
pub const TRANSIENT_INDICATORS: [&str; 5] =
    ["timeout", "rate limit", "server error", "503", "429"];

/// Default maximum retry attempts after the initial call
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for the first retry (1 second)
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// Maximum waiting time between retries (30 seconds)
pub const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Retry configuration shared by all provider clients
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt; total attempts = 1 + max_retries
    pub max_retries: u32,

    /// Base delay, doubled on each subsequent retry
    pub base_delay: Duration,

    /// Cap on any single backoff delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(MAX_RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Self::default()
        }
    }
}

/// Whether an error message indicates a transient failure.
///
/// Matching is by substring against [`TRANSIENT_INDICATORS`],
/// case-insensitive. Anything else is terminal.
pub fn is_transient(message: &str) -> bool {
    let lowered = message.to_lowercase();
    TRANSIENT_INDICATORS
        .iter()
        .any(|indicator| lowered.contains(indicator))
}

/// Backoff delay before retry number `attempt` (1-based):
/// `base_delay * 2^(attempt-1)`, capped at `max_delay`.
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
    policy
        .base_delay
        .saturating_mul(factor)
        .min(policy.max_delay)
}

/// Run `op` with the retry policy applied.
///
/// Transient errors are retried until the budget is exhausted, at which
/// point a terminal error is returned that differs from ordinary
/// failures only in message text. Terminal errors return immediately.
pub async fn invoke_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    provider: &str,
    op: F,
) -> Result<T, LlmError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let message = err.to_string();
                if !is_transient(&message) {
                    return Err(err);
                }
                if attempt > policy.max_retries {
                    return Err(LlmError::Api(format!(
                        "Maximum retries exceeded: {message}"
                    )));
                }
                let delay = backoff_delay(policy, attempt);
                warn!(
                    provider,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "transient error: {message}; retrying"
                );
                sleep(delay).await;
            }
        }
    }
}
