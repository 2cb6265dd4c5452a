use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use devisio_core::BackendConfig;

/// Bounded fixed-delay retry, used for the post-creation quote refetch (the
/// freshly written row may not be visible to an immediate read). The delay is
/// applied before every attempt so the backend gets time to settle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, delay: Duration::from_millis(300) }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), delay }
    }

    pub fn from_backend(config: &BackendConfig) -> Self {
        Self::new(config.fetch_retries, Duration::from_millis(config.fetch_retry_delay_ms))
    }

    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut attempt_fn: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match attempt_fn().await {
                Ok(value) => {
                    debug!(operation, attempt, "retryable operation succeeded");
                    return Ok(value);
                }
                Err(error) if attempt >= self.max_attempts => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %error,
                        "retryable operation exhausted its attempts"
                    );
                    return Err(error);
                }
                Err(error) => {
                    debug!(operation, attempt, error = %error, "retryable operation failed; retrying");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::RetryPolicy;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = instant_policy(3)
            .run("test.op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(42) }
            })
            .await;
        assert_eq!(result.expect("succeeds"), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<&str, String> = instant_policy(3)
            .run("test.op", || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call < 2 {
                        Err("not yet".to_owned())
                    } else {
                        Ok("ready")
                    }
                }
            })
            .await;
        assert_eq!(result.expect("third attempt succeeds"), "ready");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn surfaces_the_last_error_after_exhaustion() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = instant_policy(3)
            .run("test.op", || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("failure {call}")) }
            })
            .await;
        assert_eq!(result.expect_err("all attempts fail"), "failure 2");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn zero_attempts_is_coerced_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
