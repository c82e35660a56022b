//! Authenticated Ledyer API client.
//!
//! [`LedyerClient`] obtains and caches a bearer token, executes JSON calls with
//! exponential backoff retry, logs every attempt when logging is enabled, and returns
//! the parsed response body or a structured [`LedyerError`].
//!
//! # Request lifecycle
//!
//! ```text
//! request() ──► token() ──► cached? ──yes──┐
//!                  │                        │
//!                  no: POST oauth/token     │
//!                  (Basic auth, retried)    │
//!                                           ▼
//!               build HttpRequest (Bearer, Idempotency-Key, JSON body)
//!                                           │
//!               do_request() ◄──────────────┘
//!                  │  loop: send ──► process_response
//!                  │        transport failure / 5xx ──► sleep, retry
//!                  ▼
//!               JSON value | LedyerError
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use ledyer_om::{
//!     client::{HttpMethod, LedyerClient},
//!     settings::Settings,
//! };
//!
//! # async fn example() -> ledyer_om::Result<()> {
//! let settings = Settings::from_file("ledyer.toml")?;
//! let client = LedyerClient::new(settings.client_config(None)?)?;
//!
//! let order = client.request(HttpMethod::Get, "/v1/orders/or_2Nq", None).await?;
//! println!("{order}");
//! # Ok(())
//! # }
//! ```

mod logging;
mod token;
mod transport;

use std::{fmt, sync::Arc};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

pub use logging::{RequestLogEntry, RequestLogger, TracingRequestLogger};
pub use token::{MAX_TOKEN_TTL, TokenStore};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

use crate::{
    error::{LedyerError, Result},
    reliability::{RetryPolicy, is_retryable, retry_with_backoff},
    settings::ClientConfig,
};

/// Token exchange path, relative to the auth base URL.
const TOKEN_PATH: &str = "oauth/token?grant_type=client_credentials";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Authenticated request client.
///
/// Generic over the transport so tests can script responses; production code uses
/// [`ReqwestTransport`].
pub struct LedyerClient<T = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
    tokens: Arc<TokenStore>,
    logger: Arc<dyn RequestLogger>,
}

impl<T> fmt::Debug for LedyerClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedyerClient")
            .field("config", &self.config)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl LedyerClient<ReqwestTransport> {
    /// Creates a client using reqwest.
    ///
    /// # Errors
    ///
    /// Returns `LedyerError::TransportError` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::with_transport(config, ReqwestTransport::new()?))
    }
}

impl<T: HttpTransport> LedyerClient<T> {
    /// Creates a client over a custom transport with a private token store.
    #[must_use]
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            tokens: Arc::new(TokenStore::new()),
            logger: Arc::new(TracingRequestLogger),
        }
    }

    /// Shares a token store with other clients.
    #[must_use]
    pub fn with_token_store(mut self, tokens: Arc<TokenStore>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Replaces the request logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Returns the settings this client runs with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns a bearer token, exchanging client credentials if none is cached.
    ///
    /// The token is cached for the lifetime the OAuth server reports, capped at
    /// [`MAX_TOKEN_TTL`].
    ///
    /// # Errors
    ///
    /// Returns the provider error if the exchange fails after retries, or
    /// `LedyerError::AuthError` if the response carries no usable token.
    #[instrument(skip(self), fields(auth_base = %self.config.auth_base))]
    pub async fn token(&self) -> Result<String> {
        if let Some(token) = self.tokens.get().await {
            return Ok(token);
        }

        let url = join_url(&self.config.auth_base, TOKEN_PATH)?;
        let credentials = BASE64_STANDARD
            .encode(format!("{}:{}", self.config.client_id, self.config.client_secret));

        let request = HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: vec![
                ("Authorization", format!("Basic {credentials}")),
                ("Accept", "application/json".to_owned()),
            ],
            body: None,
            timeout: self.config.token_timeout,
        };

        let body = self.do_request(&request, &self.config.retry).await?;
        let token: TokenResponse = serde_json::from_value(body).map_err(|e| {
            LedyerError::AuthError(format!("token response missing access_token/expires_in: {e}"))
        })?;

        if token.access_token.is_empty() {
            return Err(LedyerError::AuthError("token response carried an empty token".to_owned()));
        }

        debug!(expires_in = token.expires_in, "access token obtained");
        self.tokens
            .set(token.access_token.clone(), Duration::from_secs(token.expires_in))
            .await;

        Ok(token.access_token)
    }

    /// Sends an authenticated JSON request to `endpoint`, relative to the API base.
    ///
    /// A fresh `Idempotency-Key` is generated per call and reused across its retries.
    /// `body` is sent for every method except GET.
    ///
    /// # Errors
    ///
    /// - `LedyerError::ClientError` for 4xx responses (no retry)
    /// - `LedyerError::ServerError` or `LedyerError::TransportError` once retries are
    ///   exhausted
    /// - `LedyerError::InvalidResponse` if a 2xx body is not JSON
    #[instrument(skip(self, body))]
    pub async fn request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let token = self.token().await?;
        let url = join_url(&self.config.api_base, endpoint.trim_matches('/'))?;
        let idempotency_key = Uuid::new_v4();

        let request = HttpRequest {
            method,
            url,
            headers: vec![
                ("Authorization", format!("Bearer {token}")),
                ("Content-Type", "application/json".to_owned()),
                ("Idempotency-Key", idempotency_key.to_string()),
            ],
            body: if method == HttpMethod::Get { None } else { body.cloned() },
            timeout: self.config.timeout,
        };

        let result = self.do_request(&request, &self.config.retry).await;

        if matches!(result, Err(LedyerError::ClientError { status: 401, .. })) {
            warn!("bearer token rejected, dropping cached token");
            self.tokens.invalidate().await;
        }

        result
    }

    /// Executes `request` with exponential backoff.
    ///
    /// Transport failures and 5xx responses are retried up to `policy.max_retries`
    /// times; any other outcome is returned as is. The request, including its
    /// headers, is replayed unchanged.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are exhausted, or the first
    /// non-retryable error.
    pub async fn do_request(&self, request: &HttpRequest, policy: &RetryPolicy) -> Result<Value> {
        retry_with_backoff(policy, is_retryable, move || async move {
            let started = Instant::now();
            let outcome = self.transport.send(request).await;
            self.process_response(request, outcome, started.elapsed())
        })
        .await
    }

    /// Turns one attempt's outcome into a JSON value or an error, logging it.
    ///
    /// # Errors
    ///
    /// - the transport error, unchanged
    /// - `LedyerError::ClientError`/`LedyerError::ServerError` for statuses outside
    ///   200..=299, with the provider's `errors[].message` entries as message and the
    ///   URL plus request as context
    /// - `LedyerError::InvalidResponse` if a 2xx body is not JSON
    pub fn process_response(
        &self,
        request: &HttpRequest,
        outcome: Result<HttpResponse>,
        elapsed: Duration,
    ) -> Result<Value> {
        let mut entry = RequestLogEntry::new(request.method, request.url.as_str())
            .with_request_body(request.body.clone())
            .with_duration(elapsed);
        if let Some(key) = request.header("Idempotency-Key").and_then(|k| Uuid::parse_str(k).ok()) {
            entry = entry.with_idempotency_key(key);
        }

        let response = match outcome {
            Ok(response) => response,
            Err(error) => {
                self.log(entry.with_error(error.to_string()));
                return Err(error);
            }
        };

        let parsed = parse_body(&response.body);
        entry = entry.with_status(response.status);
        entry = match &parsed {
            Ok(body) => entry.with_response_body(body.clone()),
            Err(_) => entry.with_response_body(Value::String(
                String::from_utf8_lossy(&response.body).into_owned(),
            )),
        };
        self.log(entry);

        if !(200..=299).contains(&response.status) {
            let message = parsed.as_ref().map(error_message).unwrap_or_default();
            let message = if message.is_empty() {
                format!("HTTP status {}", response.status)
            } else {
                message
            };
            return Err(LedyerError::from_status(
                response.status,
                message,
                request_context(request),
            ));
        }

        parsed
    }

    fn log(&self, entry: RequestLogEntry) {
        if self.config.logging {
            self.logger.log(&entry);
        }
    }
}

fn join_url(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| LedyerError::ConfigError(format!("cannot build URL from '{path}': {e}")))
}

/// Parses a response body; an empty body is `null`.
fn parse_body(body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| LedyerError::InvalidResponse(format!("response is not JSON: {e}")))
}

/// Concatenates the `errors[].message` entries of a provider error body.
fn error_message(body: &Value) -> String {
    body.get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|error| error.get("message").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
        .trim()
        .to_owned()
}

/// Describes a request for error context. Headers are never included.
fn request_context(request: &HttpRequest) -> String {
    let args = json!({
        "method": request.method.as_str(),
        "body": request.body,
    });
    format!("URL: {} - {args}", request.url)
}
