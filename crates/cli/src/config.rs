//! Observability settings for the `upvote` binary.
//!
//! # Environment Variables
//!
//! - `SENTRY_DSN` - Sentry error tracking DSN (tracking disabled when unset)
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `UPVOTE_LOG_JSON` - Emit logs as JSON when set
//! - `RUST_LOG` - Log filter (default: `upvote_cli=info,upvote_client=info`)
//!
//! Backend settings (`UPVOTE_API_URL`, `UPVOTE_HTTP_TIMEOUT_SECS`) are read
//! by [`upvote_client::ClientConfig::from_env`].

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "upvote_cli=info,upvote_client=info";

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub log_json: bool,
}

impl ObservabilityConfig {
    /// Load from the environment, reading `.env` first.
    ///
    /// Unparseable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_optional_env("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            log_json: get_optional_env("UPVOTE_LOG_JSON").is_some(),
        }
    }
}

/// Get an optional environment variable, treating blank as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
