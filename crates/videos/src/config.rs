use std::time::Duration;

use vidgen_core::error::CoreError;
use vidgen_core::video_request::validate_api_key;

/// Base URL used when `OPENAI_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

/// Video API client configuration loaded from environment variables.
///
/// The key is treated as opaque; it is only checked for presence.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    /// API root without a trailing slash, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Per-request HTTP timeout in seconds (default: `60`).
    pub request_timeout_secs: u64,
    /// Seconds between status polls (default: `3`).
    pub poll_interval_secs: u64,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: normalize_base_url(base_url),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                     |
    /// |------------------------------|-----------------------------|
    /// | `OPENAI_API_KEY`             | empty (calls are rejected)  |
    /// | `OPENAI_BASE_URL`            | `https://api.openai.com/v1` |
    /// | `VIDEO_REQUEST_TIMEOUT_SECS` | `60`                        |
    /// | `VIDEO_POLL_INTERVAL_SECS`   | `3`                         |
    pub fn from_env() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let base_url = std::env::var("OPENAI_BASE_URL").ok();

        let request_timeout_secs = env_u64("VIDEO_REQUEST_TIMEOUT_SECS")
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        let poll_interval_secs =
            env_u64("VIDEO_POLL_INTERVAL_SECS").unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

        Self {
            request_timeout_secs,
            poll_interval_secs,
            ..Self::new(api_key, base_url)
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_api_key(&self.api_key)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn normalize_base_url(base_url: Option<String>) -> String {
    base_url
        .map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}
