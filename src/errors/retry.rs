use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};
use super::classification::ErrorClassification;
use super::types::FixcheckError;
use crate::config::PublishConfig;

/// Backoff policy for operations against external storage.
///
/// `max_retries: 0` means a single attempt.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl From<&PublishConfig> for RetryConfig {
    fn from(config: &PublishConfig) -> Self {
        Self { max_retries: config.max_retries, ..Self::default() }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-indexed).
    ///
    /// Timeouts wait a flat five base delays; everything else backs off as
    /// `base * 2^attempt` plus up to one base of jitter, capped at `max_delay`.
    pub fn delay_for(&self, classification: &ErrorClassification, attempt: u32) -> Duration {
        let base = self.base_delay.as_secs_f64();
        let secs = if classification.error_type == "TimeoutError" {
            base * 5.0
        } else {
            base * 2.0_f64.powi(attempt.min(16) as i32) + base * rand::random::<f64>()
        };
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Run `factory` until it succeeds, the error is not retryable, or the retry
/// budget is spent. The last error is returned unchanged.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    config: &RetryConfig,
    mut factory: F,
) -> Result<T, FixcheckError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FixcheckError>>,
{
    let mut attempt = 0;
    loop {
        let err = match factory().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let classification = err.classify();
        if !classification.retryable {
            warn!(operation = operation_name, error_type = classification.error_type, "Not retrying");
            return Err(err);
        }
        if attempt >= config.max_retries {
            warn!(operation = operation_name, attempts = attempt + 1, "Retry budget exhausted");
            return Err(err);
        }

        let delay = config.delay_for(&classification, attempt);
        debug!(
            operation = operation_name,
            attempt = attempt + 1,
            error_type = classification.error_type,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(20),
        }
    }

    #[test]
    fn test_timeout_delay_is_flat() {
        let class = FixcheckError::Timeout("put".into()).classify();
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(&class, 0), Duration::from_secs(5));
        assert_eq!(config.delay_for(&class, 4), Duration::from_secs(5));
    }

    #[test]
    fn test_backoff_grows_and_is_capped() {
        let class = FixcheckError::Network("reset".into()).classify();
        let config = RetryConfig::default();
        let d0 = config.delay_for(&class, 0).as_secs_f64();
        let d1 = config.delay_for(&class, 1).as_secs_f64();
        assert!((1.0..2.0).contains(&d0));
        assert!((2.0..3.0).contains(&d1));
        assert_eq!(config.delay_for(&class, 10), Duration::from_secs(30));
    }

    #[test]
    fn test_from_publish_config() {
        let publish = PublishConfig { max_retries: 0, ..PublishConfig::default() };
        assert_eq!(RetryConfig::from(&publish).max_retries, 0);
    }

    #[tokio::test]
    async fn test_transient_error_is_retried_until_success() {
        let attempts = AtomicU32::new(0);
        let result = with_retry("put", &fast(3), || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(FixcheckError::Network("503".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let attempts = AtomicU32::new(0);
        let result = with_retry("put", &fast(3), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(FixcheckError::Config("rejected upload".into())) }
        })
        .await;
        assert!(matches!(result, Err(FixcheckError::Config(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_retries_is_single_attempt() {
        let attempts = AtomicU32::new(0);
        let result = with_retry("put", &fast(0), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(FixcheckError::Network("reset".into())) }
        })
        .await;
        assert!(matches!(result, Err(FixcheckError::Network(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
