use crate::rpc::options::{
    TransportOptions, DEFAULT_BREAKER_COOLDOWN_SECS, DEFAULT_BREAKER_FAILURE_THRESHOLD,
    DEFAULT_HTTP_BODY_LIMIT_BYTES, DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_BACKOFF_MS, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::runtime::telemetry;
use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// Connection settings for a node endpoint.
///
/// All instances must be constructed via [`ClientConfig::builder`],
/// [`ClientConfig::new`] or [`ClientConfig::from_env`] so invariants are
/// validated before any consumer observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    rpc_url: String,
    rpc_user: Option<String>,
    rpc_password: Option<String>,
    request_timeout: Duration,
    max_attempts: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
    max_request_body_bytes: usize,
    max_response_body_bytes: usize,
    breaker_failure_threshold: usize,
    breaker_cooldown: Duration,
    metrics_interval: Duration,
}

pub struct ClientConfigParams {
    pub rpc_url: String,
    pub rpc_user: Option<String>,
    pub rpc_password: Option<String>,
    pub request_timeout: Duration,
    pub max_attempts: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_request_body_bytes: usize,
    pub max_response_body_bytes: usize,
    pub breaker_failure_threshold: usize,
    pub breaker_cooldown: Duration,
    pub metrics_interval: Duration,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Constructs a configuration directly from the provided values.
    ///
    /// Prefer [`ClientConfig::builder`] when most values use defaults.
    pub fn new(params: ClientConfigParams) -> Result<Self> {
        let ClientConfigParams {
            rpc_url,
            rpc_user,
            rpc_password,
            request_timeout,
            max_attempts,
            initial_backoff,
            max_backoff,
            max_request_body_bytes,
            max_response_body_bytes,
            breaker_failure_threshold,
            breaker_cooldown,
            metrics_interval,
        } = params;

        let config = Self {
            rpc_url: rpc_url.trim().to_owned(),
            rpc_user: rpc_user.map(|user| user.trim().to_owned()),
            rpc_password,
            request_timeout,
            max_attempts,
            initial_backoff,
            max_backoff,
            max_request_body_bytes,
            max_response_body_bytes,
            breaker_failure_threshold,
            breaker_cooldown,
            metrics_interval,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reads `ETHRPC_*` environment variables, falling back to defaults for
    /// anything unset.
    ///
    /// | variable | meaning |
    /// |---|---|
    /// | `ETHRPC_URL` | node endpoint (`http://localhost:8545`) |
    /// | `ETHRPC_USER` / `ETHRPC_PASSWORD` | optional Basic auth pair |
    /// | `ETHRPC_TIMEOUT_MS` | per-attempt timeout |
    /// | `ETHRPC_MAX_ATTEMPTS` | attempts per request |
    /// | `ETHRPC_INITIAL_BACKOFF_MS` / `ETHRPC_MAX_BACKOFF_MS` | retry backoff |
    /// | `ETHRPC_MAX_REQUEST_BYTES` / `ETHRPC_MAX_RESPONSE_BYTES` | body limits |
    /// | `ETHRPC_BREAKER_THRESHOLD` / `ETHRPC_BREAKER_COOLDOWN_MS` | breaker tuning |
    /// | `ETHRPC_METRICS_INTERVAL_MS` | metrics reporter period |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let params = ClientConfigParams {
            rpc_url: read("ETHRPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            rpc_user: read("ETHRPC_USER"),
            rpc_password: read("ETHRPC_PASSWORD"),
            request_timeout: Duration::from_millis(parse_with_default(
                &read,
                "ETHRPC_TIMEOUT_MS",
                DEFAULT_REQUEST_TIMEOUT_SECS * 1_000,
            )?),
            max_attempts: parse_with_default(&read, "ETHRPC_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
            initial_backoff: Duration::from_millis(parse_with_default(
                &read,
                "ETHRPC_INITIAL_BACKOFF_MS",
                DEFAULT_INITIAL_BACKOFF_MS,
            )?),
            max_backoff: Duration::from_millis(parse_with_default(
                &read,
                "ETHRPC_MAX_BACKOFF_MS",
                DEFAULT_MAX_BACKOFF_MS,
            )?),
            max_request_body_bytes: parse_with_default(
                &read,
                "ETHRPC_MAX_REQUEST_BYTES",
                DEFAULT_HTTP_BODY_LIMIT_BYTES,
            )?,
            max_response_body_bytes: parse_with_default(
                &read,
                "ETHRPC_MAX_RESPONSE_BYTES",
                DEFAULT_HTTP_BODY_LIMIT_BYTES,
            )?,
            breaker_failure_threshold: parse_with_default(
                &read,
                "ETHRPC_BREAKER_THRESHOLD",
                DEFAULT_BREAKER_FAILURE_THRESHOLD,
            )?,
            breaker_cooldown: Duration::from_millis(parse_with_default(
                &read,
                "ETHRPC_BREAKER_COOLDOWN_MS",
                DEFAULT_BREAKER_COOLDOWN_SECS * 1_000,
            )?),
            metrics_interval: Duration::from_millis(parse_with_default(
                &read,
                "ETHRPC_METRICS_INTERVAL_MS",
                telemetry::DEFAULT_METRICS_INTERVAL.as_millis() as u64,
            )?),
        };

        Self::new(params)
    }

    /// Full node URL, including the `http://` scheme.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Basic auth credentials, if configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.rpc_user, &self.rpc_password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }

    /// Timeout applied to each individual HTTP attempt.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    pub fn max_request_body_bytes(&self) -> usize {
        self.max_request_body_bytes
    }

    pub fn max_response_body_bytes(&self) -> usize {
        self.max_response_body_bytes
    }

    /// Consecutive failures that open the circuit breaker.
    pub fn breaker_failure_threshold(&self) -> usize {
        self.breaker_failure_threshold
    }

    /// How long the breaker stays open before admitting a probe.
    pub fn breaker_cooldown(&self) -> Duration {
        self.breaker_cooldown
    }

    /// Interval used by the metrics reporter.
    pub fn metrics_interval(&self) -> Duration {
        self.metrics_interval
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            request_timeout: self.request_timeout,
            max_attempts: self.max_attempts,
            initial_backoff: self.initial_backoff,
            max_backoff: self.max_backoff,
            max_request_body_bytes: self.max_request_body_bytes,
            max_response_body_bytes: self.max_response_body_bytes,
            breaker_failure_threshold: self.breaker_failure_threshold,
            breaker_cooldown: self.breaker_cooldown,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_url(&self.rpc_url)?;

        match (&self.rpc_user, &self.rpc_password) {
            (Some(user), Some(_)) => ensure_not_empty(user, "rpc_user")?,
            (None, None) => {}
            _ => bail!("rpc_user and rpc_password must be set together"),
        }

        if self.metrics_interval.is_zero() {
            bail!("metrics_interval must be greater than 0");
        }

        self.transport_options().validate()
    }
}

#[derive(Debug, Default, Clone)]
pub struct ClientConfigBuilder {
    rpc_url: Option<String>,
    rpc_user: Option<String>,
    rpc_password: Option<String>,
    request_timeout: Option<Duration>,
    max_attempts: Option<usize>,
    initial_backoff: Option<Duration>,
    max_backoff: Option<Duration>,
    max_request_body_bytes: Option<usize>,
    max_response_body_bytes: Option<usize>,
    breaker_failure_threshold: Option<usize>,
    breaker_cooldown: Option<Duration>,
    metrics_interval: Option<Duration>,
}

impl ClientConfigBuilder {
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.rpc_user = Some(user.into());
        self.rpc_password = Some(password.into());
        self
    }

    pub fn rpc_user(mut self, user: impl Into<String>) -> Self {
        self.rpc_user = Some(user.into());
        self
    }

    pub fn rpc_password(mut self, password: impl Into<String>) -> Self {
        self.rpc_password = Some(password.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = Some(backoff);
        self
    }

    pub fn max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = Some(backoff);
        self
    }

    pub fn max_request_body_bytes(mut self, bytes: usize) -> Self {
        self.max_request_body_bytes = Some(bytes);
        self
    }

    pub fn max_response_body_bytes(mut self, bytes: usize) -> Self {
        self.max_response_body_bytes = Some(bytes);
        self
    }

    pub fn breaker_failure_threshold(mut self, failures: usize) -> Self {
        self.breaker_failure_threshold = Some(failures);
        self
    }

    pub fn breaker_cooldown(mut self, cooldown: Duration) -> Self {
        self.breaker_cooldown = Some(cooldown);
        self
    }

    pub fn metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = Some(interval);
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let params = ClientConfigParams {
            rpc_url: self.rpc_url.context("rpc_url is required")?,
            rpc_user: self.rpc_user,
            rpc_password: self.rpc_password,
            request_timeout: self
                .request_timeout
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            initial_backoff: self
                .initial_backoff
                .unwrap_or_else(|| Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS)),
            max_backoff: self
                .max_backoff
                .unwrap_or_else(|| Duration::from_millis(DEFAULT_MAX_BACKOFF_MS)),
            max_request_body_bytes: self
                .max_request_body_bytes
                .unwrap_or(DEFAULT_HTTP_BODY_LIMIT_BYTES),
            max_response_body_bytes: self
                .max_response_body_bytes
                .unwrap_or(DEFAULT_HTTP_BODY_LIMIT_BYTES),
            breaker_failure_threshold: self
                .breaker_failure_threshold
                .unwrap_or(DEFAULT_BREAKER_FAILURE_THRESHOLD),
            breaker_cooldown: self
                .breaker_cooldown
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_BREAKER_COOLDOWN_SECS)),
            metrics_interval: self
                .metrics_interval
                .unwrap_or(telemetry::DEFAULT_METRICS_INTERVAL),
        };

        ClientConfig::new(params)
    }
}

fn parse_with_default<T, F>(read: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match read(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("failed to parse {key}='{value}'")),
        None => Ok(default),
    }
}

fn ensure_not_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{field} cannot be empty");
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<()> {
    let Some(authority) = url.strip_prefix("http://") else {
        bail!("rpc_url must start with http://");
    };
    if authority.is_empty() || authority.starts_with('/') {
        bail!("rpc_url must include a host");
    }
    Ok(())
}
