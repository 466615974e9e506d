//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `UPVOTE_API_URL` - Backend base address (default: `http://localhost:8080`)
//! - `UPVOTE_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds. Unset means
//!   requests wait for the backend indefinitely.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Backend address used when `UPVOTE_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Invalid API URL {0}: {1}")]
    InvalidUrl(String, String),
}

/// Where and how the client reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base address of the backend. Always ends with `/` so that relative
    /// API paths resolve beneath it.
    pub api_url: Url,
    /// Optional per-request timeout.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Build a configuration for the given base address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `api_url` is not an absolute
    /// http(s) URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            timeout: None,
        })
    }

    /// Set a per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = get_env_or_default("UPVOTE_API_URL", DEFAULT_API_URL);
        let mut config = Self::new(&api_url)?;

        if let Some(raw) = get_optional_env("UPVOTE_HTTP_TIMEOUT_SECS") {
            let secs = raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("UPVOTE_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

/// Parse a base address, insisting on http(s) and a trailing slash.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl(raw.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(
            raw.to_string(),
            format!("unsupported scheme {}", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}
