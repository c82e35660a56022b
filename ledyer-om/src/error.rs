//! Error types for the Ledyer order-management bridge.
//!
//! All errors implement the standard [`std::error::Error`] trait via [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Transport Errors** ([`LedyerError::TransportError`]): no HTTP status was received
//! - **Provider Errors** ([`LedyerError::ServerError`], [`LedyerError::ClientError`]): Ledyer
//!   answered with a non-2xx status
//! - **Data Errors** ([`LedyerError::DataError`]): the order store holds malformed state
//! - **Configuration Errors** ([`LedyerError::ConfigError`], [`LedyerError::AuthError`]):
//!   settings or credentials are unusable
//!
//! # Examples
//!
//! ```
//! use ledyer_om::error::{LedyerError, Result};
//!
//! fn require_currency(code: &str) -> Result<&str> {
//!     if code.is_empty() {
//!         return Err(LedyerError::DataError("order has no currency".to_owned()));
//!     }
//!     Ok(code)
//! }
//! ```

use thiserror::Error;

/// Result type alias for bridge operations.
///
/// All fallible functions in this crate return this type.
pub type Result<T> = std::result::Result<T, LedyerError>;

/// Errors that can occur while mapping or submitting orders.
///
/// # Error Recovery
///
/// - **Transient errors** ([`TransportError`](Self::TransportError),
///   [`ServerError`](Self::ServerError)): already retried with exponential backoff by the
///   client; surfacing means the retry budget was exhausted
/// - **Client errors** ([`ClientError`](Self::ClientError)): fix the payload, the provider
///   rejected it
/// - **Data errors** ([`DataError`](Self::DataError)): repair the order in the store
/// - **Configuration errors** ([`ConfigError`](Self::ConfigError),
///   [`AuthError`](Self::AuthError)): check settings and credentials
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum LedyerError {
    /// The request never produced an HTTP status.
    ///
    /// Covers connection refusal, DNS failures, TLS failures and per-attempt timeouts.
    #[error("transport failure: {0}")]
    TransportError(String),

    /// Ledyer answered with a 5xx status.
    ///
    /// `message` holds the concatenated `errors[].message` entries of the response body
    /// and `context` the URL and request that produced it.
    #[error("server error {status}: {message}")]
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Concatenated provider error messages.
        message: String,
        /// URL and request description.
        context: String,
    },

    /// Ledyer answered with a status outside 2xx that is below 500.
    ///
    /// Never retried.
    ///
    /// # Examples
    ///
    /// ```
    /// use ledyer_om::error::LedyerError;
    ///
    /// let err = LedyerError::ClientError {
    ///     status: 400,
    ///     message: "quantity must be positive".to_owned(),
    ///     context: "URL: https://api.sandbox.ledyer.com/v1/orders".to_owned(),
    /// };
    /// assert_eq!(err.status(), Some(400));
    /// assert!(err.to_string().contains("quantity must be positive"));
    /// ```
    #[error("client error {status}: {message}")]
    ClientError {
        /// HTTP status code.
        status: u16,
        /// Concatenated provider error messages.
        message: String,
        /// URL and request description.
        context: String,
    },

    /// The order or product state could not be mapped.
    #[error("invalid order data: {0}")]
    DataError(String),

    /// The client-credentials exchange did not yield a usable token.
    #[error("authentication failed: {0}")]
    AuthError(String),

    /// Settings are missing or invalid.
    #[error("invalid configuration: {0}")]
    ConfigError(String),

    /// A 2xx response carried a body that is not JSON.
    #[error("invalid response body: {0}")]
    InvalidResponse(String),

    /// A request payload could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl LedyerError {
    /// Returns the HTTP status code carried by provider errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::ServerError { status, .. } | Self::ClientError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the request context attached to provider errors.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::ServerError { context, .. } | Self::ClientError { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// Builds a provider error from a non-2xx status.
    ///
    /// Statuses of 500 and above become [`ServerError`](Self::ServerError), everything else
    /// [`ClientError`](Self::ClientError).
    pub(crate) fn from_status(status: u16, message: String, context: String) -> Self {
        if status >= 500 {
            Self::ServerError { status, message, context }
        } else {
            Self::ClientError { status, message, context }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = LedyerError::TransportError("connection refused".into());
        assert_eq!(error.to_string(), "transport failure: connection refused");
    }

    #[test]
    fn test_data_error() {
        let error = LedyerError::DataError("missing currency".into());
        assert!(error.to_string().contains("invalid order data"));
    }

    #[test]
    fn test_from_status_splits_on_500() {
        let server = LedyerError::from_status(503, "busy".to_owned(), "URL: x".to_owned());
        assert!(matches!(server, LedyerError::ServerError { status: 503, .. }));

        let client = LedyerError::from_status(422, "bad".to_owned(), "URL: x".to_owned());
        assert!(matches!(client, LedyerError::ClientError { status: 422, .. }));

        let redirect = LedyerError::from_status(302, String::new(), String::new());
        assert!(matches!(redirect, LedyerError::ClientError { status: 302, .. }));
    }

    #[test]
    fn test_status_and_context_accessors() {
        let error = LedyerError::from_status(400, "nope".to_owned(), "URL: a - {}".to_owned());
        assert_eq!(error.status(), Some(400));
        assert_eq!(error.context(), Some("URL: a - {}"));

        let error = LedyerError::AuthError("no token".to_owned());
        assert_eq!(error.status(), None);
        assert_eq!(error.context(), None);
    }
}
