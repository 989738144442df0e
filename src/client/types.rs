use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the task service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("housing-analytics/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Build from `HOUSING_API_URL` and `HOUSING_API_TIMEOUT_SECS`, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("HOUSING_API_URL") {
            config = config.with_base_url(url);
        }

        if let Ok(raw) = std::env::var("HOUSING_API_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout_secs = secs,
                _ => warn!("Ignoring invalid HOUSING_API_TIMEOUT_SECS={:?}", raw),
            }
        }

        config
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn task_url(&self, task_id: impl std::fmt::Display) -> String {
        format!("{}/tasks/{}", self.base_url, task_id)
    }

    pub fn analytics_url(&self, task_id: impl std::fmt::Display) -> String {
        format!("{}/tasks/{}/analytics", self.base_url, task_id)
    }
}
