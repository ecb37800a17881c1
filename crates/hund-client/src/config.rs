//! Client configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the client can start with zero
//! configuration against the public deployment.

use std::path::PathBuf;
use std::time::Duration;

use hund_shared::constants::{
    DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the API, without trailing slash.
    /// Env: `HUND_BASE_URL`
    /// Default: `https://hund.piaseczny.dev`
    pub base_url: String,

    /// Timeout applied to every call except index generation.
    /// Env: `HUND_REQUEST_TIMEOUT_SECS` (`0` disables)
    /// Default: 30 seconds
    pub request_timeout: Option<Duration>,

    /// Timeout for index generation.  A server-side build can take ten
    /// minutes or more, so this is unbounded unless set.
    /// Env: `HUND_GENERATE_TIMEOUT_SECS` (`0` disables)
    /// Default: none
    pub generate_timeout: Option<Duration>,

    /// TCP connect timeout.
    /// Env: `HUND_CONNECT_TIMEOUT_SECS`
    /// Default: 10 seconds
    pub connect_timeout: Duration,

    /// Path of the session database.
    /// Env: `HUND_DB_PATH`
    /// Default: `None` (platform data directory).
    pub db_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            generate_timeout: None,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            db_path: None,
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at an explicit base URL, defaults otherwise.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("HUND_BASE_URL") {
            if url.trim().is_empty() {
                tracing::warn!("Empty HUND_BASE_URL, using default");
            } else {
                config.base_url = normalize_base_url(&url);
            }
        }

        if let Some(val) = lookup("HUND_REQUEST_TIMEOUT_SECS") {
            match parse_timeout(&val) {
                Some(timeout) => config.request_timeout = timeout,
                None => tracing::warn!(value = %val, "Invalid HUND_REQUEST_TIMEOUT_SECS, using default"),
            }
        }

        if let Some(val) = lookup("HUND_GENERATE_TIMEOUT_SECS") {
            match parse_timeout(&val) {
                Some(timeout) => config.generate_timeout = timeout,
                None => tracing::warn!(value = %val, "Invalid HUND_GENERATE_TIMEOUT_SECS, using default"),
            }
        }

        if let Some(val) = lookup("HUND_CONNECT_TIMEOUT_SECS") {
            match val.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.connect_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid HUND_CONNECT_TIMEOUT_SECS, using default"),
            }
        }

        if let Some(path) = lookup("HUND_DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// `Some(None)` means "no timeout", `None` means the value did not parse.
fn parse_timeout(raw: &str) -> Option<Option<Duration>> {
    match raw.trim().parse::<u64>().ok()? {
        0 => Some(None),
        secs => Some(Some(Duration::from_secs(secs))),
    }
}
