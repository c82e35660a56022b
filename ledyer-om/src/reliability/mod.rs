//! Reliability patterns for Ledyer calls.
//!
//! Provides the retry loop shared by the token exchange and data requests.

mod retry;

pub use retry::{RetryPolicy, is_retryable, retry_with_backoff};
