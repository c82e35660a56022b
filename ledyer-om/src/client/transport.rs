//! HTTP transport seam.
//!
//! [`HttpTransport`] executes exactly one request. It never retries and never
//! interprets the status code; non-2xx responses come back as `Ok`. Only failures
//! that produced no status at all are errors.

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;
use std::{fmt, time::Duration};

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::error::{LedyerError, Result};

/// HTTP method of a Ledyer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET, never carries a body.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// PATCH.
    Patch,
    /// DELETE.
    Delete,
}

impl HttpMethod {
    /// Returns the method name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully prepared request.
///
/// The same value is replayed unchanged on every retry, so headers such as
/// `Idempotency-Key` stay stable across attempts.
#[derive(Clone)]
pub struct HttpRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Absolute request URL.
    pub url: Url,
    /// Header name/value pairs.
    pub headers: Vec<(&'static str, String)>,
    /// JSON body, if any.
    pub body: Option<Value>,
    /// Per-attempt timeout.
    pub timeout: Duration,
}

impl HttpRequest {
    /// Returns the value of the first header named `name`, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(key, value)| {
                if key.eq_ignore_ascii_case("authorization") {
                    (*key, "[REDACTED]")
                } else {
                    (*key, value.as_str())
                }
            })
            .collect();

        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &headers)
            .field("body", &self.body)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Raw response of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
}

/// Single-request HTTP abstraction.
///
/// # Examples
///
/// ```
/// use ledyer_om::{
///     client::{HttpRequest, HttpResponse, HttpTransport},
///     error::Result,
/// };
///
/// /// Answers every request with an empty 204.
/// struct NoContent;
///
/// impl HttpTransport for NoContent {
///     async fn send<'a>(&'a self, _request: &'a HttpRequest) -> Result<HttpResponse> {
///         Ok(HttpResponse { status: 204, body: Vec::new() })
///     }
/// }
/// ```
pub trait HttpTransport: Send + Sync {
    /// Executes one request.
    ///
    /// # Errors
    ///
    /// Returns `LedyerError::TransportError` if no HTTP status was received.
    fn send<'a>(
        &'a self,
        request: &'a HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse>> + Send + 'a;
}

/// Production transport using reqwest.
///
/// Connection pooling and TLS come from the wrapped [`Client`]; the timeout is applied
/// per request.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with a fresh connection pool.
    ///
    /// # Errors
    ///
    /// Returns `LedyerError::TransportError` if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LedyerError::TransportError(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    async fn send<'a>(&'a self, request: &'a HttpRequest) -> Result<HttpResponse> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder =
            self.client.request(method, request.url.clone()).timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport_error)?.to_vec();

        Ok(HttpResponse { status, body })
    }
}

fn transport_error(error: reqwest::Error) -> LedyerError {
    let kind = if error.is_timeout() {
        "timeout"
    } else if error.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    LedyerError::TransportError(format!("{kind}: {error}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request() -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: Url::parse("https://api.sandbox.ledyer.com/v1/orders/or_1/edit").unwrap(),
            headers: vec![
                ("Authorization", "Bearer secret-token".to_owned()),
                ("Content-Type", "application/json".to_owned()),
            ],
            body: Some(json!({"orderLines": []})),
            timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_method_names() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let request = request();
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("Idempotency-Key"), None);
    }

    #[test]
    fn test_debug_redacts_authorization() {
        let debug = format!("{:?}", request());
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("application/json"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let transport = ReqwestTransport::new().unwrap();
        let mut request = request();
        // Port 9 (discard) is closed on test machines.
        request.url = Url::parse("http://127.0.0.1:9/oauth/token").unwrap();
        request.timeout = Duration::from_secs(2);

        let result = transport.send(&request).await;
        assert!(matches!(result, Err(LedyerError::TransportError(_))));
    }
}
