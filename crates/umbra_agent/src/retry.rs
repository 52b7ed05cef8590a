//! Retry logic with exponential backoff for publishing.
//!
//! Retries on transient feed errors (throttling, 5xx, network timeouts).
//! Does NOT retry on authentication or malformed-request errors.

use std::future::Future;
use std::time::Duration;
use umbra_core::config::RetryConfig;
use umbra_core::FeedError;

/// Delay before retry number `retry` (1-based), capped at the configured maximum.
pub fn backoff_delay(config: &RetryConfig, retry: u32) -> Duration {
    let exp = config.backoff_factor.max(1.0).powi(retry.saturating_sub(1) as i32);
    let secs = (config.initial_delay().as_secs_f64() * exp).min(config.max_delay().as_secs_f64());
    Duration::from_secs_f64(secs)
}

/// Execute an async feed operation with retry logic.
///
/// The `operation` closure is called repeatedly until it succeeds, returns a
/// non-transient error, or `max_attempts` is exhausted. Returns the last error
/// if every attempt failed.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, label: &str, mut operation: F) -> Result<T, FeedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FeedError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "{} succeeded on retry", label);
                }
                return Ok(value);
            }
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = backoff_delay(config, attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    "{} failed: {}. Retrying in {:.1}s",
                    label,
                    e,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::error!(attempt, "{}: all {} attempts exhausted", label, max_attempts);
                }
                return Err(e);
            }
        }
    }
}
