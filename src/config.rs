//! Client configuration.
//!
//! Where the analysis service lives, how often jobs are polled, and the
//! fixed geometry the layout engine uses.

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;
use crate::layout::LayoutConfig;

/// Default service location (local development backend)
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variables read by [`ClientConfig::from_env`]
pub const ENV_API_URL: &str = "CODEFORGE_API_URL";
pub const ENV_POLL_INTERVAL_MS: &str = "CODEFORGE_POLL_INTERVAL_MS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "CODEFORGE_REQUEST_TIMEOUT_MS";

/// Configuration for the analysis client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the analysis service, without a trailing slash.
    pub base_url: String,

    /// Interval between status polls (milliseconds).
    ///
    /// A poll is never issued while the previous one is unresolved, so slow
    /// responses stretch the effective period rather than stacking requests.
    pub poll_interval_ms: u64,

    /// Per-request timeout (milliseconds).
    pub request_timeout_ms: u64,

    /// Layout geometry.
    pub layout: LayoutConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            poll_interval_ms: 2000, // 2 seconds
            request_timeout_ms: 30_000,
            layout: LayoutConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at the given service URL.
    pub fn with_base_url(url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url(url)?,
            ..Default::default()
        })
    }

    /// Read overrides from the process environment.
    ///
    /// Unset variables keep their defaults; set but invalid ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_API_URL) {
            config.base_url = parse_url(&url)?;
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            config.poll_interval_ms = parse_millis(ENV_POLL_INTERVAL_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            config.request_timeout_ms = parse_millis(ENV_REQUEST_TIMEOUT_MS, &raw)?;
        }
        Ok(config)
    }

    /// Point at a different service, keeping every other setting.
    pub fn base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_url(url)?;
        Ok(self)
    }

    /// Set the poll interval.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the request timeout.
    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Full URL for a service path such as `/status/{id}`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Get poll interval as Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Get request timeout as Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Validate an http(s) base URL and return it without a trailing slash.
fn parse_url(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: "expected an http(s) base URL".to_string(),
        });
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn parse_millis(key: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(ms),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}
