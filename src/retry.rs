//! Retry logic with fixed or exponential backoff
//!
//! Both the clip page lookup and the media download run through [`with_retry`].
//! Errors decide for themselves whether another attempt can help via [`IsRetryable`].
//!
//! # Example
//!
//! ```no_run
//! use savant_dl::retry::{IsRetryable, with_retry};
//! use savant_dl::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! let result = with_retry(&config, |_attempt| async {
//!     // Your operation here
//!     Ok::<_, MyError>(())
//! }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, bad statuses, connection reset, truncated bodies)
/// return `true`. Permanent failures (missing markup, bad input, bad config) return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // A request that could not even be built will fail the same way again
            Error::Network(e) => !e.is_builder(),
            // Any non-success status is treated as a transient upstream fault
            Error::HttpStatus { .. } => true,
            Error::IncompleteBody { .. } => true,
            // I/O while streaming to disk restarts the download from scratch
            Error::Io(_) => true,
            // The page has no video; asking again will not change that
            Error::ContentAbsent { .. } => false,
            Error::Config { .. }
            | Error::Csv(_)
            | Error::Serialization(_)
            | Error::Schema { .. }
            | Error::Selector(_)
            | Error::InvalidDate(_)
            | Error::TaskPanicked(_)
            | Error::InputUnavailable { .. }
            | Error::Other(_) => false,
        }
    }
}

/// Execute an async operation, retrying transient failures
///
/// The operation receives the 1-based attempt number. At most
/// `config.max_attempts` attempts are made (a value of 0 is treated as 1).
/// Between attempts the task sleeps for at least `config.backoff_delay`.
///
/// Returns the first success, the first non-retryable error, or the last error
/// once attempts are exhausted.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    let mut delay = config.backoff_delay;

    loop {
        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis(),
                    "Operation failed, retrying"
                );

                let wait = if config.jitter { add_jitter(delay) } else { delay };
                tokio::time::sleep(wait).await;

                let next_delay =
                    Duration::try_from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier)
                        .unwrap_or(config.max_delay);
                delay = next_delay.min(config.max_delay).max(config.backoff_delay);
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt,
                        "Operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::debug!(error = %e, "Operation failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Add random jitter to a delay
///
/// The result lies between `delay` and `2 * delay`, so it never undercuts the
/// configured backoff. A product too large for a `Duration` leaves `delay` as is.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::try_from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor)).unwrap_or(delay)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    enum TestError {
        Transient,
        Permanent,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                TestError::Transient => write!(f, "transient error"),
                TestError::Permanent => write!(f, "permanent error"),
            }
        }
    }

    impl IsRetryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    fn fast(max_attempts: u32, delay_ms: u64) -> RetryConfig {
        RetryConfig {
            max_attempts,
            backoff_delay: Duration::from_millis(delay_ms),
            max_delay: Duration::from_secs(1),
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    #[tokio::test]
    async fn test_success_no_retry() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(&fast(5, 10), |_| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TestError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "should only call once");
    }

    #[tokio::test]
    async fn test_retry_transient_then_succeed() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(&fast(5, 10), |_| {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(
            counter.load(Ordering::SeqCst),
            3,
            "two failures then a success is three attempts"
        );
    }

    #[tokio::test]
    async fn test_attempts_never_exceed_max_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(&fast(3, 5), |_| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(
            counter.load(Ordering::SeqCst),
            3,
            "max_attempts counts every attempt including the first"
        );
    }

    #[tokio::test]
    async fn test_operation_sees_one_based_attempt_numbers() {
        let seen = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let _ = with_retry(&fast(4, 1), |attempt| {
            let seen = seen_clone.clone();
            async move {
                seen.lock().await.push(attempt);
                Err::<(), _>(TestError::Transient)
            }
        })
        .await;

        assert_eq!(*seen.lock().await, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_permanent_error_no_retry() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(&fast(5, 10), |_| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Permanent)
            }
        })
        .await;

        assert!(matches!(result, Err(TestError::Permanent)));
        assert_eq!(
            counter.load(Ordering::SeqCst),
            1,
            "should not retry permanent error"
        );
    }

    #[tokio::test]
    async fn test_zero_max_attempts_still_tries_once() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(&fast(0, 1), |_| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        assert!(matches!(result, Err(TestError::Transient)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gaps_between_attempts_are_at_least_backoff_delay() {
        let timestamps = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let ts_clone = timestamps.clone();

        let _ = with_retry(&fast(4, 40), |_| {
            let ts = ts_clone.clone();
            async move {
                ts.lock().await.push(std::time::Instant::now());
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        let ts = timestamps.lock().await;
        assert_eq!(ts.len(), 4);
        for pair in ts.windows(2) {
            let gap = pair[1].duration_since(pair[0]);
            assert!(
                gap >= Duration::from_millis(40),
                "gap {gap:?} shorter than backoff delay"
            );
        }
    }

    #[tokio::test]
    async fn test_multiplier_grows_delay_up_to_cap() {
        let config = RetryConfig {
            max_attempts: 4,
            backoff_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(50),
            backoff_multiplier: 10.0,
            jitter: false,
        };

        let timestamps = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let ts_clone = timestamps.clone();

        let _ = with_retry(&config, |_| {
            let ts = ts_clone.clone();
            async move {
                ts.lock().await.push(std::time::Instant::now());
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        let ts = timestamps.lock().await;
        let last_gap = ts[3].duration_since(ts[2]);
        assert!(last_gap >= Duration::from_millis(50), "capped delay too short");
        assert!(
            last_gap < Duration::from_millis(500),
            "delay should be capped at max_delay, was {last_gap:?}"
        );
    }

    #[tokio::test]
    async fn test_huge_multiplier_clamps_to_max_delay() {
        let config = RetryConfig {
            max_attempts: 3,
            backoff_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            backoff_multiplier: 1e300,
            jitter: true,
        };
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let handle = tokio::spawn(async move {
            with_retry(&config, |_| {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(TestError::Transient)
                }
            })
            .await
        });

        let result = handle.await.expect("retry loop must not panic");
        assert!(matches!(result, Err(TestError::Transient)));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_add_jitter_saturates_instead_of_panicking() {
        assert_eq!(add_jitter(Duration::MAX), Duration::MAX);
    }

    #[test]
    fn test_add_jitter_stays_within_bounds_over_many_iterations() {
        let delay = Duration::from_millis(50);
        for i in 0..200 {
            let jittered = add_jitter(delay);
            assert!(
                jittered >= delay,
                "iteration {i}: jittered {jittered:?} < base delay {delay:?}"
            );
            assert!(
                jittered <= delay * 2,
                "iteration {i}: jittered {jittered:?} > 2x base delay"
            );
        }
    }

    #[test]
    fn test_status_and_truncation_errors_are_retryable() {
        assert!(
            Error::HttpStatus {
                url: "u".into(),
                status: 503
            }
            .is_retryable()
        );
        assert!(
            Error::HttpStatus {
                url: "u".into(),
                status: 404
            }
            .is_retryable()
        );
        assert!(
            Error::IncompleteBody {
                url: "u".into(),
                expected: 10,
                received: 4
            }
            .is_retryable()
        );
        assert!(
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset"
            ))
            .is_retryable()
        );
    }

    #[test]
    fn test_content_and_input_errors_are_permanent() {
        assert!(
            !Error::ContentAbsent {
                play_id: "abc".into()
            }
            .is_retryable()
        );
        assert!(
            !Error::Schema {
                source_name: "x.csv".into(),
                missing: vec!["playId".into()]
            }
            .is_retryable()
        );
        assert!(!Error::config("bad", "chunk_size").is_retryable());
        assert!(!Error::Other("unknown problem".into()).is_retryable());
        assert!(!Error::TaskPanicked("boom".into()).is_retryable());
    }
}
