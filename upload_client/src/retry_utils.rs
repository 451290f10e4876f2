use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{Result, UploadClientError};

/// Classification of a failed attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retryable {
    /// Worth another attempt after backing off.
    Transient,

    /// Retrying cannot succeed; fail immediately.
    Fatal,
}

/// Decides whether a given error is worth retrying.
pub trait RetryableStrategy: Send + Sync {
    fn handle(&self, err: &UploadClientError) -> Retryable;
}

/// Default classification: backend or transport trouble is transient;
/// anything the backend rejected outright is fatal, so a doomed transfer
/// fails without consuming the remaining attempts.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultRetryableStrategy;

impl RetryableStrategy for DefaultRetryableStrategy {
    fn handle(&self, err: &UploadClientError) -> Retryable {
        match err {
            UploadClientError::Server(_) | UploadClientError::Connection(_) | UploadClientError::IOError(_) => {
                Retryable::Transient
            },
            _ => Retryable::Fatal,
        }
    }
}

/// Retries every failure identically, whatever the backend reported.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformRetryableStrategy;

impl RetryableStrategy for UniformRetryableStrategy {
    fn handle(&self, _err: &UploadClientError) -> Retryable {
        Retryable::Transient
    }
}

/// Bounded retry with exponential backoff.
#[derive(Clone, Copy, Debug)]
pub struct RetryConfig {
    /// Total number of attempts, the first one included.
    pub max_attempts: usize,

    /// Delay before the second attempt; doubles for each attempt after that.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryConfig {
    /// Backoff delay after the given zero-based attempt fails.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        // Cap the shift; attempts are small but the delay must not wrap.
        self.base_delay * (1u32 << attempt.min(16))
    }
}

/// Executes a request-generating closure with bounded retry and exponential
/// backoff.
///
/// Each failure is classified by the strategy: a fatal error is returned
/// immediately, a transient one is retried after the backoff delay until the
/// attempt budget is spent, at which point the last error is returned.
pub async fn retry_wrapper<T, S, F, Fut>(create_request: F, retry_config: RetryConfig, strategy: &S) -> Result<T>
where
    S: RetryableStrategy,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = retry_config.max_attempts.max(1);

    for attempt in 0.. {
        let result = create_request().await;

        // If all is ok, then return.
        let Err(e) = &result else {
            return result;
        };

        // Do we retry?
        if strategy.handle(e) == Retryable::Fatal || attempt + 1 >= max_attempts {
            return result;
        }

        let delay = retry_config.delay_for_attempt(attempt);
        warn!("Attempt {} failed ({e}); retrying after {delay:?}.", attempt + 1);
        tokio::time::sleep(delay).await;
    }

    unreachable!("Retry loop should exit via return on success or final failure");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn quick_retry(max_attempts: usize) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_transient_error_recovers() {
        let n_calls = AtomicUsize::new(0);

        let result = retry_wrapper(
            || async {
                if n_calls.fetch_add(1, Ordering::Relaxed) < 2 {
                    Err(UploadClientError::Server("busy".to_owned()))
                } else {
                    Ok(7)
                }
            },
            quick_retry(3),
            &DefaultRetryableStrategy,
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(n_calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_fatal_error_fails_on_first_attempt() {
        let n_calls = AtomicUsize::new(0);

        let result: Result<()> = retry_wrapper(
            || async {
                n_calls.fetch_add(1, Ordering::Relaxed);
                Err(UploadClientError::Validation("bad chunk".to_owned()))
            },
            quick_retry(3),
            &DefaultRetryableStrategy,
        )
        .await;

        assert_eq!(result.unwrap_err(), UploadClientError::Validation(String::new()));
        assert_eq!(n_calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_attempt_budget_exhausted() {
        let n_calls = AtomicUsize::new(0);

        let result: Result<()> = retry_wrapper(
            || async {
                n_calls.fetch_add(1, Ordering::Relaxed);
                Err(UploadClientError::Connection("refused".to_owned()))
            },
            quick_retry(3),
            &DefaultRetryableStrategy,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(n_calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_uniform_strategy_retries_fatal_errors() {
        let n_calls = AtomicUsize::new(0);

        let result: Result<()> = retry_wrapper(
            || async {
                n_calls.fetch_add(1, Ordering::Relaxed);
                Err(UploadClientError::Validation("bad chunk".to_owned()))
            },
            quick_retry(3),
            &UniformRetryableStrategy,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(n_calls.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_backoff_doubles() {
        let config = RetryConfig {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
        };

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
    }
}
