//! Client configuration: server location and timeouts.

use std::time::Duration;

use crate::error::{ApiError, Result};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme, host and optional prefix; never ends with `/`.
    pub base_url: String,
    /// Upper bound on one request/response exchange.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Read `BLORP_BASE_URL`, `BLORP_TIMEOUT_SECS` and
    /// `BLORP_CONNECT_TIMEOUT_SECS`, falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(base_url) = lookup("BLORP_BASE_URL") {
            config = config.with_base_url(&parse_base_url(&base_url)?);
        }
        if let Some(secs) = lookup("BLORP_TIMEOUT_SECS") {
            config.request_timeout = parse_secs("BLORP_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("BLORP_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = parse_secs("BLORP_CONNECT_TIMEOUT_SECS", &secs)?;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Accept only absolute `http`/`https` URLs.
fn parse_base_url(value: &str) -> Result<String> {
    let invalid = |reason: String| ApiError::InvalidConfig(format!("BLORP_BASE_URL={value:?}: {reason}"));
    let url = reqwest::Url::parse(value.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(value.trim().to_string()),
        scheme => Err(invalid(format!("unsupported scheme `{scheme}`"))),
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ApiError::InvalidConfig(format!("{key}={value:?}: {e}")))
}
