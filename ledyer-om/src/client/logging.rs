//! Request/response logging.
//!
//! When logging is enabled every attempt the client makes is reported to a
//! [`RequestLogger`]. Entries never carry request headers, and OAuth tokens in
//! response bodies are redacted before an entry is built.

use std::time::{Duration, SystemTime};

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::transport::HttpMethod;

/// Response body fields that are replaced before logging.
const REDACTED_FIELDS: &[&str] = &["access_token", "refresh_token", "id_token"];

/// One logged attempt.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use ledyer_om::client::{HttpMethod, RequestLogEntry};
/// use serde_json::json;
///
/// let entry = RequestLogEntry::new(HttpMethod::Post, "https://auth.sandbox.ledyer.com/oauth/token")
///     .with_status(200)
///     .with_response_body(json!({"access_token": "abc", "expires_in": 3600}))
///     .with_duration(Duration::from_millis(120));
///
/// assert_eq!(entry.response_body.as_ref().unwrap()["access_token"], "[REDACTED]");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct RequestLogEntry {
    /// When the attempt finished.
    pub timestamp: SystemTime,
    /// Request method.
    pub method: HttpMethod,
    /// Request URL.
    pub url: String,
    /// Idempotency key of the call, absent for the token exchange.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<Uuid>,
    /// JSON request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    /// HTTP status, absent when the transport failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Decoded response body, or the raw text if it was not JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Value>,
    /// Transport error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Attempt duration in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl RequestLogEntry {
    /// Creates an entry for a request to `url`.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            method,
            url: url.into(),
            idempotency_key: None,
            request_body: None,
            status: None,
            response_body: None,
            error: None,
            duration_ms: None,
        }
    }

    /// Adds the idempotency key.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: Uuid) -> Self {
        self.idempotency_key = Some(key);
        self
    }

    /// Adds the request body.
    #[must_use]
    pub fn with_request_body(mut self, body: Option<Value>) -> Self {
        self.request_body = body;
        self
    }

    /// Adds the response status.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Adds the response body, redacting token fields.
    #[must_use]
    pub fn with_response_body(mut self, mut body: Value) -> Self {
        redact_tokens(&mut body);
        self.response_body = Some(body);
        self
    }

    /// Adds a transport error description.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Adds the attempt duration.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "duration in ms fits u64 for practical values"
    )]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = Some(duration.as_millis() as u64);
        self
    }
}

/// Sink for request/response log entries.
///
/// # Examples
///
/// ```
/// use std::sync::Mutex;
///
/// use ledyer_om::client::{RequestLogEntry, RequestLogger};
///
/// /// Keeps entries in memory.
/// #[derive(Default)]
/// struct Collect(Mutex<Vec<RequestLogEntry>>);
///
/// impl RequestLogger for Collect {
///     fn log(&self, entry: &RequestLogEntry) {
///         self.0.lock().unwrap().push(entry.clone());
///     }
/// }
/// ```
pub trait RequestLogger: Send + Sync {
    /// Records one attempt.
    fn log(&self, entry: &RequestLogEntry);
}

/// Logs entries as tracing events with target `ledyer_om::requests`.
///
/// Route the target to its own file or drop it with an `EnvFilter` directive such as
/// `ledyer_om::requests=off`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRequestLogger;

impl RequestLogger for TracingRequestLogger {
    fn log(&self, entry: &RequestLogEntry) {
        let request_body = entry.request_body.as_ref().map(Value::to_string);
        let response_body = entry.response_body.as_ref().map(Value::to_string);

        tracing::info!(
            target: "ledyer_om::requests",
            timestamp = ?entry.timestamp,
            method = %entry.method,
            url = %entry.url,
            idempotency_key = ?entry.idempotency_key,
            status = ?entry.status,
            request_body = request_body.as_deref().unwrap_or(""),
            response_body = response_body.as_deref().unwrap_or(""),
            error = entry.error.as_deref().unwrap_or(""),
            duration_ms = ?entry.duration_ms,
            "LEDYER REQUEST"
        );
    }
}

/// Replaces token fields anywhere in `value` with `[REDACTED]`.
fn redact_tokens(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *field = Value::String("[REDACTED]".to_owned());
                } else {
                    redact_tokens(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_tokens),
        _ => {}
    }
}
