use polinet_core::{CoreError, PlatformApiError};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Configuration for bounded retry with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Base delay for exponential backoff (in milliseconds)
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    /// Preset for whole-scan restarts: slower base to respect the
    /// shared quota window.
    pub fn scan() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            max_delay_ms: 60000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.2,
        }
    }
}

/// Retry strategy based on error type
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Retry with exponential backoff
    Retry,
    /// Retry after a server-specified delay
    RetryWithDelay(Duration),
    /// Don't retry (permanent failures)
    NoRetry,
}

/// Transport-class failures restart the operation; rate limits wait the
/// server-specified delay; everything else is terminal.
pub fn retry_strategy(error: &CoreError) -> RetryStrategy {
    match error {
        CoreError::Platform(PlatformApiError::RateLimitExceeded { retry_after }) => {
            RetryStrategy::RetryWithDelay(Duration::from_secs(*retry_after))
        }
        e if e.is_transport() => RetryStrategy::Retry,
        _ => RetryStrategy::NoRetry,
    }
}

/// Exponential backoff with jitter, capped at `max_delay_ms`.
pub fn backoff_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let exponential = if attempt == 0 {
        config.base_delay_ms
    } else {
        let multiplier = config.backoff_multiplier.powi(attempt as i32);
        (config.base_delay_ms as f64 * multiplier) as u64
    };
    let capped = exponential.min(config.max_delay_ms);

    let jitter_range = (capped as f64 * config.jitter_factor) as u64;
    let jitter = fastrand::u64(0..=jitter_range);

    Duration::from_millis((capped + jitter).min(config.max_delay_ms))
}

/// Drives a fallible operation through bounded retries. Permanent
/// failures return the original error untouched; exhausting the
/// attempt budget surfaces [`CoreError::RetriesExhausted`].
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    config: &RetryConfig,
    operation: F,
) -> Result<T, CoreError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut last_error: Option<CoreError> = None;

    for attempt in 0..config.max_attempts {
        if attempt > 0 {
            debug!("Retry attempt {} for {}", attempt, operation_name);
        }

        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    info!("Operation {} succeeded after {} retries", operation_name, attempt);
                }
                return Ok(value);
            }
            Err(err) => {
                let attempts_left = attempt + 1 < config.max_attempts;
                match retry_strategy(&err) {
                    RetryStrategy::NoRetry => {
                        debug!("Not retrying {} due to error type: {}", operation_name, err);
                        return Err(err);
                    }
                    RetryStrategy::Retry if attempts_left => {
                        let delay = backoff_delay(attempt, config);
                        warn!("Retrying {} in {:?} due to: {}", operation_name, delay, err);
                        last_error = Some(err);
                        sleep(delay).await;
                    }
                    RetryStrategy::RetryWithDelay(delay) if attempts_left => {
                        warn!(
                            "Retrying {} after specified delay of {:?} due to: {}",
                            operation_name, delay, err
                        );
                        last_error = Some(err);
                        sleep(delay).await;
                    }
                    _ => {
                        last_error = Some(err);
                        break;
                    }
                }
            }
        }
    }

    let last_error = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "Unknown error".to_string());
    error!(
        "Operation {} failed after {} attempts: {}",
        operation_name, config.max_attempts, last_error
    );

    Err(CoreError::RetriesExhausted {
        attempts: config.max_attempts,
        last_error,
    })
}
