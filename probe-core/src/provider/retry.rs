//! Shared retry logic for model providers
//!
//! This module provides exponential backoff with jitter for retrying
//! transient errors like rate limiting, service unavailability, and
//! network issues.

use super::ProviderError;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Configuration for retry behavior on transient errors (throttling, rate limits)
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 8)
    pub max_attempts: usize,
    /// Base delay in milliseconds for exponential backoff (default: 500ms)
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds (default: 30000ms)
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

/// Information about a retry attempt
#[derive(Debug, Clone)]
pub struct RetryInfo {
    /// Which attempt this is (1-based)
    pub attempt: usize,
    /// Maximum attempts configured
    pub max_attempts: usize,
    /// How long we'll wait before retrying
    pub delay: Duration,
    /// The error that triggered the retry
    pub error: String,
}

/// Callback type for retry events
pub type RetryCallback = Arc<dyn Fn(RetryInfo) + Send + Sync>;

/// Determine if an error is transient and should be retried
pub fn is_retryable_error(err: &ProviderError) -> bool {
    match err {
        // These are transient and should be retried
        ProviderError::RateLimited(_) => true,
        ProviderError::ServiceUnavailable(_) => true,
        ProviderError::Network(_) => true,
        ProviderError::Communication(_) => true,

        // These are permanent and should not be retried
        ProviderError::Authentication(_) => false,
        ProviderError::Configuration(_) => false,
        ProviderError::Model(_) => false,
        ProviderError::Other(_) => false,
    }
}

/// Calculate backoff delay for a given attempt using exponential backoff with jitter
pub fn backoff_delay(attempt: usize, config: &RetryConfig) -> Duration {
    let shift = (attempt.saturating_sub(1)).min(10) as u32;
    let exp = 1_u64.checked_shl(shift).unwrap_or(u64::MAX);
    let base = config.base_delay_ms.saturating_mul(exp);
    let capped = base.min(config.max_delay_ms);
    let jittered = jitter_ms(capped);
    Duration::from_millis(jittered)
}

/// Apply ±20% jitter to a base delay
fn jitter_ms(base_ms: u64) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as i64;
    let jitter_pct = (nanos % 41) - 20; // -20..20
    let base = base_ms as i64;
    let jittered = base + (base * jitter_pct / 100);
    jittered.max(0) as u64
}

/// Retry an async operation with exponential backoff
///
/// Only retries on transient errors (rate limiting, service unavailable, network).
/// Permanent errors (authentication, configuration, model) fail immediately.
///
/// # Example
///
/// ```ignore
/// let result = retry_with_backoff(
///     || async { provider.generate(messages.clone(), tools.clone(), system.clone()).await },
///     &config,
///     &Some(Arc::new(|info| eprintln!("Retry {}: {}", info.attempt, info.error))),
/// ).await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T>(
    mut op: F,
    config: &RetryConfig,
    on_retry: &Option<RetryCallback>,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                if attempt >= config.max_attempts || !is_retryable_error(&err) {
                    return Err(err);
                }
                let delay = backoff_delay(attempt, config);

                // Notify callback if set
                if let Some(callback) = on_retry {
                    callback(RetryInfo {
                        attempt,
                        max_attempts: config.max_attempts,
                        delay,
                        error: err.to_string(),
                    });
                }

                tokio::time::sleep(delay).await;
            }
        }
    }
}
