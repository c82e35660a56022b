//! Exponential backoff retry for transient Ledyer failures.
//!
//! Transport failures and 5xx responses are retried; everything else surfaces on the
//! first attempt.

use std::time::Duration;

use crate::LedyerError;

/// Configuration for retry behavior.
///
/// The first attempt is not counted: a policy with `max_retries = 4` makes at most
/// five attempts. Delays grow as `initial_delay * backoff_multiplier ^ retry`, capped
/// at `max_delay`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use ledyer_om::reliability::RetryPolicy;
///
/// // Default policy: 4 retries, 500ms initial delay, doubling
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.delay_for_retry(3), Duration::from_secs(4));
///
/// // No retries at all
/// let once = RetryPolicy::with_max_retries(0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt (default: 4)
    pub max_retries: u32,
    /// Delay before the first retry (default: 500ms)
    pub initial_delay: Duration,
    /// Upper bound for a single delay (default: 30s)
    pub max_delay: Duration,
    /// Multiplier for exponential backoff (default: 2.0)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 4,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy with a custom retry budget.
    ///
    /// # Examples
    ///
    /// ```
    /// use ledyer_om::reliability::RetryPolicy;
    ///
    /// let policy = RetryPolicy::with_max_retries(2);
    /// assert_eq!(policy.max_retries, 2);
    /// ```
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self { max_retries, ..Self::default() }
    }

    /// Calculates the delay before retry number `retry` (zero-based).
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        #[allow(
            clippy::cast_precision_loss,
            reason = "acceptable for duration calculations"
        )]
        let delay_ms = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "float to int casts saturate and the result is capped at max_delay"
        )]
        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }
}

/// Executes `operation` with exponential backoff retry.
///
/// An error is retried only while `should_retry` accepts it and the retry budget is
/// not spent. The task sleeps between attempts; it does not block the runtime thread.
///
/// # Examples
///
/// ```
/// use std::sync::{
///     Arc,
///     atomic::{AtomicU32, Ordering},
/// };
///
/// use ledyer_om::reliability::{RetryPolicy, retry_with_backoff};
///
/// # async fn example() -> Result<String, String> {
/// let policy = RetryPolicy::default();
/// let attempt = Arc::new(AtomicU32::new(0));
///
/// let result = retry_with_backoff(&policy, |_: &String| true, || {
///     let attempt = Arc::clone(&attempt);
///     async move {
///         let n = attempt.fetch_add(1, Ordering::Relaxed);
///         if n < 2 {
///             Err("temporary failure".to_string())
///         } else {
///             Ok("success".to_string())
///         }
///     }
/// })
/// .await?;
///
/// assert_eq!(result, "success");
/// # Ok(result)
/// # }
/// ```
///
/// # Errors
///
/// Returns the last error once the budget is spent, or the first error
/// `should_retry` rejects.
pub async fn retry_with_backoff<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut retry = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if retry > 0 {
                    tracing::info!(attempt = retry + 1, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) if retry < policy.max_retries && should_retry(&error) => {
                let delay = policy.delay_for_retry(retry);
                tracing::warn!(
                    attempt = retry + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis(),
                    error = %error,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(error) => {
                tracing::debug!(attempt = retry + 1, error = %error, "Operation failed, giving up");
                return Err(error);
            }
        }
    }
}

/// Determines if an error is retryable.
///
/// # Examples
///
/// ```
/// use ledyer_om::{LedyerError, reliability::is_retryable};
///
/// assert!(is_retryable(&LedyerError::TransportError("timed out".to_string())));
/// assert!(!is_retryable(&LedyerError::DataError("no currency".to_string())));
/// ```
///
/// # Retryable Errors
///
/// - Transport failures (no response received)
/// - Server errors (5xx status codes)
///
/// # Non-Retryable Errors
///
/// - Client errors (4xx status codes)
/// - Order data, configuration and authentication errors
/// - Malformed response bodies
#[must_use]
pub const fn is_retryable(error: &LedyerError) -> bool {
    matches!(error, LedyerError::TransportError(_) | LedyerError::ServerError { .. })
}

#[cfg(test)]
#[allow(clippy::str_to_string, reason = "test code uses these patterns for readability")]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::time::Instant;

    use super::*;

    fn server_error() -> LedyerError {
        LedyerError::ServerError {
            status: 503,
            message: "Service Unavailable".to_string(),
            context: String::new(),
        }
    }

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 4);
        assert_eq!(policy.initial_delay, Duration::from_millis(500));
        assert!((policy.backoff_multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_delay_for_retry() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for_retry(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for_retry(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_retry(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for_retry(3), Duration::from_secs(4));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let policy = RetryPolicy { max_delay: Duration::from_secs(1), ..RetryPolicy::default() };

        assert_eq!(policy.delay_for_retry(10), Duration::from_secs(1));
        assert_eq!(policy.delay_for_retry(u32::MAX), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_server_errors() {
        let policy = RetryPolicy::default();
        let call_count = Arc::new(Mutex::new(0));

        let start = Instant::now();
        let count_clone = Arc::clone(&call_count);
        let result = retry_with_backoff(&policy, is_retryable, || {
            let count = Arc::clone(&count_clone);
            async move {
                let mut c = count.lock().unwrap();
                *c += 1;
                let current = *c;
                drop(c);

                if current <= 3 { Err(server_error()) } else { Ok::<i32, LedyerError>(42) }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(*call_count.lock().unwrap(), 4);
        // 0.5s + 1s + 2s
        assert_eq!(start.elapsed(), Duration::from_millis(3500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_budget() {
        let policy = RetryPolicy::default();
        let call_count = Arc::new(Mutex::new(0));

        let count_clone = Arc::clone(&call_count);
        let result = retry_with_backoff(&policy, is_retryable, || {
            let count = Arc::clone(&count_clone);
            async move {
                *count.lock().unwrap() += 1;
                Err::<i32, LedyerError>(LedyerError::TransportError("connection reset".to_string()))
            }
        })
        .await;

        assert!(matches!(result, Err(LedyerError::TransportError(_))));
        assert_eq!(*call_count.lock().unwrap(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_returns_immediately() {
        let policy = RetryPolicy::default();
        let call_count = Arc::new(Mutex::new(0));

        let start = Instant::now();
        let count_clone = Arc::clone(&call_count);
        let result = retry_with_backoff(&policy, is_retryable, || {
            let count = Arc::clone(&count_clone);
            async move {
                *count.lock().unwrap() += 1;
                Err::<i32, LedyerError>(LedyerError::ClientError {
                    status: 400,
                    message: "Bad Request".to_string(),
                    context: String::new(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(LedyerError::ClientError { status: 400, .. })));
        assert_eq!(*call_count.lock().unwrap(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_zero_retries_single_attempt() {
        let policy = RetryPolicy::with_max_retries(0);
        let call_count = Arc::new(Mutex::new(0));

        let count_clone = Arc::clone(&call_count);
        let result = retry_with_backoff(&policy, is_retryable, || {
            let count = Arc::clone(&count_clone);
            async move {
                *count.lock().unwrap() += 1;
                Err::<i32, LedyerError>(server_error())
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(*call_count.lock().unwrap(), 1);
    }

    #[test]
    fn test_is_retryable_classification() {
        assert!(is_retryable(&server_error()));
        assert!(is_retryable(&LedyerError::TransportError("timeout".to_string())));

        assert!(!is_retryable(&LedyerError::ClientError {
            status: 404,
            message: String::new(),
            context: String::new(),
        }));
        assert!(!is_retryable(&LedyerError::DataError("bad".to_string())));
        assert!(!is_retryable(&LedyerError::AuthError("denied".to_string())));
        assert!(!is_retryable(&LedyerError::ConfigError("missing".to_string())));
        assert!(!is_retryable(&LedyerError::InvalidResponse("garbage".to_string())));
    }
}
