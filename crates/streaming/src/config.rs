use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Where the grid service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Local service base URL.
    pub base_url: String,
    /// Remote service base URL; falls back to `base_url` when unset.
    pub remote_base_url: Option<String>,
    /// Whole-request timeout. `None` leaves timeouts to the transport.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            remote_base_url: None,
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Reads `GRID_API_URL`, `GRID_REMOTE_API_URL` and `GRID_HTTP_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        let base_url = env::var("GRID_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let remote_base_url = env::var("GRID_REMOTE_API_URL").ok();
        let timeout = env::var("GRID_HTTP_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis);

        Self {
            base_url,
            remote_base_url,
            timeout,
        }
    }

    /// Base URL for a local or remote request, without a trailing slash.
    pub fn prefix(&self, remote: bool) -> &str {
        let base = if remote {
            self.remote_base_url.as_deref().unwrap_or(&self.base_url)
        } else {
            &self.base_url
        };
        base.trim_end_matches('/')
    }

    pub fn endpoint(&self, remote: bool, path: &str) -> String {
        format!("{}/{}", self.prefix(remote), path.trim_start_matches('/'))
    }
}
