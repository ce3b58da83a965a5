// crates/client/src/config.rs
//! Backend connection settings.

use std::time::Duration;

/// Where the backend listens when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Env var overriding the backend base URL.
pub const API_URL_ENV: &str = "DATADESK_API_URL";

/// Env var setting a request timeout in seconds. Unset = transport default.
pub const TIMEOUT_ENV: &str = "DATADESK_TIMEOUT_SECS";

/// Connection settings for [`crate::HttpBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Read settings from `DATADESK_API_URL` / `DATADESK_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(API_URL_ENV).ok(),
            std::env::var(TIMEOUT_ENV).ok(),
        )
    }

    /// Build settings from raw variable values. Blank or unparsable values
    /// fall back to the defaults.
    pub fn from_vars(api_url: Option<String>, timeout_secs: Option<String>) -> Self {
        let base_url = api_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout = timeout_secs.and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(0) => None,
            Ok(secs) => Some(Duration::from_secs(secs)),
            Err(_) => {
                tracing::warn!(value = %raw, "ignoring invalid {TIMEOUT_ENV}");
                None
            }
        });

        Self { base_url, timeout }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
