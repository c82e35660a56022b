//! Ledyer settings.
//!
//! Settings are TOML-deserializable. Credentials and environment flags live in one of
//! two gateway sections, `[checkout]` and `[payments]`; the checkout section wins when
//! both are present. Everything else has defaults.
//!
//! ```toml
//! [checkout]
//! test_mode = true
//! environment = "sandbox"
//! logging = true
//! client_id = "my-client"
//! client_secret = "my-secret"
//!
//! [http]
//! timeout_secs = 10
//!
//! [retry]
//! max_retries = 4
//!
//! [endpoints]
//! capture_order = "/v1/orders/{id}/capture"
//! ```

use std::{path::Path, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::{
    error::{LedyerError, Result},
    reliability::RetryPolicy,
};

/// Environment variable overriding the configured client id.
pub const CLIENT_ID_ENV: &str = "LEDYER_CLIENT_ID";

/// Environment variable overriding the configured client secret.
pub const CLIENT_SECRET_ENV: &str = "LEDYER_CLIENT_SECRET";

/// Root settings document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Settings shared with the Ledyer Checkout gateway.
    #[serde(default)]
    pub checkout: Option<GatewaySettings>,

    /// Settings shared with the Ledyer Payments gateway.
    #[serde(default)]
    pub payments: Option<GatewaySettings>,

    /// HTTP timeouts and base URL overrides.
    #[serde(default)]
    pub http: HttpSettings,

    /// Retry behavior for transient failures.
    #[serde(default)]
    pub retry: RetrySettings,

    /// Endpoint path templates.
    #[serde(default)]
    pub endpoints: EndpointSettings,
}

/// Gateway whose settings a client uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gateway {
    /// Ledyer Checkout.
    Checkout,
    /// Ledyer Payments.
    Payments,
}

/// Test environment selected when test mode is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Environment {
    /// Public sandbox.
    #[default]
    Sandbox,
    /// Ledyer development stack.
    Development,
    /// Local frontend against the development stack.
    LocalFe,
    /// Fully local stack in Docker.
    Local,
}

/// Per-gateway credentials and flags.
#[derive(Clone, Default, Deserialize)]
pub struct GatewaySettings {
    /// Use a test environment instead of live.
    #[serde(default, alias = "testmode")]
    pub test_mode: bool,

    /// Test environment; ignored unless `test_mode` is set.
    #[serde(default, alias = "development_test_environment")]
    pub environment: Environment,

    /// Log every request and response.
    #[serde(default)]
    pub logging: bool,

    /// OAuth client id.
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret.
    #[serde(default)]
    pub client_secret: String,
}

impl std::fmt::Debug for GatewaySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewaySettings")
            .field("test_mode", &self.test_mode)
            .field("environment", &self.environment)
            .field("logging", &self.logging)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// HTTP settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-attempt timeout for data calls, in seconds.
    pub timeout_secs: u64,
    /// Per-attempt timeout for the token exchange, in seconds.
    pub token_timeout_secs: u64,
    /// Overrides the environment's auth base URL.
    pub auth_base_url: Option<String>,
    /// Overrides the environment's API base URL.
    pub api_base_url: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 10, token_timeout_secs: 60, auth_base_url: None, api_base_url: None }
    }
}

/// Retry settings, converted into a [`RetryPolicy`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound for a single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier applied per retry.
    pub backoff_multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            backoff_multiplier: policy.backoff_multiplier,
        }
    }
}

impl RetrySettings {
    /// Builds the retry policy these settings describe.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
        }
    }
}

/// Endpoint path templates. Use `{id}` as placeholder for the Ledyer order id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointSettings {
    /// Order-lines edit endpoint (default: "/v1/orders/{id}/edit").
    pub edit_order: Option<String>,

    /// Capture endpoint (default: "/v1/orders/{id}/capture").
    pub capture_order: Option<String>,
}

impl EndpointSettings {
    /// Default edit endpoint template.
    pub const DEFAULT_EDIT_ORDER: &'static str = "/v1/orders/{id}/edit";
    /// Default capture endpoint template.
    pub const DEFAULT_CAPTURE_ORDER: &'static str = "/v1/orders/{id}/capture";

    /// Returns the edit endpoint template.
    #[must_use]
    pub fn edit_order(&self) -> &str {
        self.edit_order.as_deref().unwrap_or(Self::DEFAULT_EDIT_ORDER)
    }

    /// Returns the capture endpoint template.
    #[must_use]
    pub fn capture_order(&self) -> &str {
        self.capture_order.as_deref().unwrap_or(Self::DEFAULT_CAPTURE_ORDER)
    }

    /// Validates endpoint templates for security issues.
    ///
    /// Checks that endpoint templates:
    /// - Do not contain path traversal sequences (`..`, `//`)
    /// - Do not start with absolute paths on Windows (`C:`, `D:`, etc.)
    /// - Start with `/` (relative paths only)
    ///
    /// # Errors
    ///
    /// Returns `LedyerError::ConfigError` if any endpoint is invalid.
    pub fn validate(&self) -> Result<()> {
        let endpoints = [("edit_order", &self.edit_order), ("capture_order", &self.capture_order)];

        for (name, endpoint) in endpoints {
            if let Some(path) = endpoint {
                validate_endpoint_path(name, path)?;
            }
        }

        Ok(())
    }
}

/// Validates an endpoint path template for security issues.
fn validate_endpoint_path(name: &str, path: &str) -> Result<()> {
    if path.contains("..") {
        return Err(LedyerError::ConfigError(format!(
            "endpoint '{name}' contains path traversal sequence '..': {path}"
        )));
    }

    if path.contains("//") {
        return Err(LedyerError::ConfigError(format!(
            "endpoint '{name}' contains double slash '//': {path}"
        )));
    }

    if path.len() >= 2 && path.chars().nth(1) == Some(':') {
        return Err(LedyerError::ConfigError(format!(
            "endpoint '{name}' appears to be an absolute Windows path: {path}"
        )));
    }

    if !path.starts_with('/') {
        return Err(LedyerError::ConfigError(format!(
            "endpoint '{name}' must start with '/': {path}"
        )));
    }

    Ok(())
}

/// Settings a client runs with, resolved for one gateway.
#[derive(Clone)]
pub struct ClientConfig {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Whether a test environment is used.
    pub test_mode: bool,
    /// Whether requests are logged.
    pub logging: bool,
    /// Base URL of the OAuth server, with trailing slash.
    pub auth_base: Url,
    /// Base URL of the order-management API, with trailing slash.
    pub api_base: Url,
    /// Per-attempt timeout for data calls.
    pub timeout: Duration,
    /// Per-attempt timeout for the token exchange.
    pub token_timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("test_mode", &self.test_mode)
            .field("logging", &self.logging)
            .field("auth_base", &self.auth_base.as_str())
            .field("api_base", &self.api_base.as_str())
            .field("timeout", &self.timeout)
            .field("token_timeout", &self.token_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Settings {
    /// Parses settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `LedyerError::ConfigError` if the TOML is malformed or fails
    /// [`validate`](Self::validate).
    ///
    /// # Examples
    ///
    /// ```
    /// use ledyer_om::settings::{Environment, Settings};
    ///
    /// let settings = Settings::from_toml(
    ///     r#"
    ///     [payments]
    ///     test_mode = true
    ///     environment = "development"
    ///     client_id = "id"
    ///     client_secret = "secret"
    /// "#,
    /// )?;
    ///
    /// let gateway = settings.gateway(None)?;
    /// assert_eq!(gateway.environment, Environment::Development);
    /// # Ok::<(), ledyer_om::LedyerError>(())
    /// ```
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)
            .map_err(|e| LedyerError::ConfigError(format!("invalid settings TOML: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `LedyerError::ConfigError` if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LedyerError::ConfigError(format!("cannot read settings file {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Validates timeouts, retry settings, base URL overrides and endpoint templates.
    ///
    /// # Errors
    ///
    /// Returns `LedyerError::ConfigError` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 || self.http.token_timeout_secs == 0 {
            return Err(LedyerError::ConfigError("timeouts must be positive".to_owned()));
        }

        if !self.retry.backoff_multiplier.is_finite() || self.retry.backoff_multiplier < 1.0 {
            return Err(LedyerError::ConfigError(format!(
                "backoff_multiplier must be at least 1.0, got {}",
                self.retry.backoff_multiplier
            )));
        }

        for (name, base) in
            [("auth_base_url", &self.http.auth_base_url), ("api_base_url", &self.http.api_base_url)]
        {
            if let Some(base) = base {
                parse_base_url(name, base)?;
            }
        }

        self.endpoints.validate()
    }

    /// Returns the gateway settings to use.
    ///
    /// `preferred` selects the gateway the order was paid through. Without it, or when
    /// that section is missing, checkout settings are used first and payments settings
    /// second.
    ///
    /// # Errors
    ///
    /// Returns `LedyerError::ConfigError` if neither section is present.
    pub fn gateway(&self, preferred: Option<Gateway>) -> Result<&GatewaySettings> {
        let preferred = match preferred {
            Some(Gateway::Checkout) => self.checkout.as_ref(),
            Some(Gateway::Payments) => self.payments.as_ref(),
            None => None,
        };

        preferred
            .or(self.checkout.as_ref())
            .or(self.payments.as_ref())
            .ok_or_else(|| {
                LedyerError::ConfigError(
                    "no gateway settings: add a [checkout] or [payments] section".to_owned(),
                )
            })
    }

    /// Resolves the settings a client runs with.
    ///
    /// Credentials from `LEDYER_CLIENT_ID` and `LEDYER_CLIENT_SECRET` take precedence
    /// over the configured ones.
    ///
    /// # Errors
    ///
    /// Returns `LedyerError::ConfigError` if no gateway is configured, credentials are
    /// missing, or a base URL override is invalid.
    pub fn client_config(&self, preferred: Option<Gateway>) -> Result<ClientConfig> {
        let gateway = self.gateway(preferred)?;

        let client_id = env_override(CLIENT_ID_ENV).unwrap_or_else(|| gateway.client_id.clone());
        let client_secret =
            env_override(CLIENT_SECRET_ENV).unwrap_or_else(|| gateway.client_secret.clone());

        if client_id.is_empty() || client_secret.is_empty() {
            return Err(LedyerError::ConfigError(format!(
                "client credentials missing: set client_id/client_secret or {CLIENT_ID_ENV}/{CLIENT_SECRET_ENV}"
            )));
        }

        let auth_base = match &self.http.auth_base_url {
            Some(base) => parse_base_url("auth_base_url", base)?,
            None => parse_base_url("auth_base_url", gateway.auth_base())?,
        };
        let api_base = match &self.http.api_base_url {
            Some(base) => parse_base_url("api_base_url", base)?,
            None => parse_base_url("api_base_url", gateway.api_base())?,
        };

        Ok(ClientConfig {
            client_id,
            client_secret,
            test_mode: gateway.test_mode,
            logging: gateway.logging,
            auth_base,
            api_base,
            timeout: Duration::from_secs(self.http.timeout_secs),
            token_timeout: Duration::from_secs(self.http.token_timeout_secs),
            retry: self.retry.policy(),
        })
    }
}

impl GatewaySettings {
    /// Returns the OAuth base URL for the configured environment.
    ///
    /// # Examples
    ///
    /// ```
    /// use ledyer_om::settings::{Environment, GatewaySettings};
    ///
    /// let live = GatewaySettings::default();
    /// assert_eq!(live.auth_base(), "https://auth.live.ledyer.com/");
    ///
    /// let local = GatewaySettings {
    ///     test_mode: true,
    ///     environment: Environment::Local,
    ///     ..GatewaySettings::default()
    /// };
    /// assert_eq!(local.auth_base(), "http://host.docker.internal:9001/");
    /// ```
    #[must_use]
    pub const fn auth_base(&self) -> &'static str {
        if !self.test_mode {
            return "https://auth.live.ledyer.com/";
        }
        match self.environment {
            Environment::Local => "http://host.docker.internal:9001/",
            Environment::Development | Environment::LocalFe => "https://auth.dev.ledyer.com/",
            Environment::Sandbox => "https://auth.sandbox.ledyer.com/",
        }
    }

    /// Returns the order-management API base URL for the configured environment.
    #[must_use]
    pub const fn api_base(&self) -> &'static str {
        if !self.test_mode {
            return "https://api.live.ledyer.com/";
        }
        match self.environment {
            Environment::Local => "http://host.docker.internal:9000/",
            Environment::Development | Environment::LocalFe => "https://api.dev.ledyer.com/",
            Environment::Sandbox => "https://api.sandbox.ledyer.com/",
        }
    }
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Parses a base URL and makes sure relative joins stay below its path.
fn parse_base_url(name: &str, base: &str) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| LedyerError::ConfigError(format!("invalid {name} '{base}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(LedyerError::ConfigError(format!(
            "{name} must use http or https, got: {}",
            url.scheme()
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
