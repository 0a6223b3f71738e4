//! Client configuration.
//!
//! Built-in defaults, overridden by environment variables:
//!
//! - `TRENDBENCH_API_URL` - base URL of the trend service, including the `/api` prefix
//! - `TRENDBENCH_TIMEOUT_SECS` - per-request timeout in seconds

use std::time::Duration;

use crate::error::TrendError;

/// Environment variable holding the API base URL.
pub const API_URL_ENV: &str = "TRENDBENCH_API_URL";

/// Environment variable holding the request timeout in seconds.
pub const TIMEOUT_ENV: &str = "TRENDBENCH_TIMEOUT_SECS";

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Default request timeout (30 seconds).
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the trend service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, TrendError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TrendError> {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_ENV) {
            config = config.with_base_url(url)?;
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                TrendError::config(format!("{TIMEOUT_ENV} must be a whole number of seconds, got '{raw}'"))
            })?;
            if secs == 0 {
                return Err(TrendError::config(format!("{TIMEOUT_ENV} must be greater than zero")));
            }
            config.timeout = Duration::from_secs(secs);
        }

        tracing::debug!(base_url = %config.base_url, timeout_secs = config.timeout.as_secs(), "API config loaded");
        Ok(config)
    }

    /// Set the base URL, validating the scheme and trimming trailing slashes.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Result<Self, TrendError> {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(TrendError::config("API URL must not be empty"));
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(TrendError::config(format!("API URL must start with http:// or https://, got '{url}'")));
        }
        self.base_url = trimmed.to_string();
        Ok(self)
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Join a path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
