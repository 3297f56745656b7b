use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://glbg.servergi.com:8072/ISIMGLB";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/100.0.0.0 Safari/537.36";

/// Connection settings for the ERP origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Origin plus application prefix, e.g. `https://host:8072/ISIMGLB`.
    pub base_url: String,
    /// Browser-like User-Agent; the ERP serves a degraded page to unknown agents.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// The production host has served self-signed certificates in the past.
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            accept_invalid_certs: false,
        }
    }
}

impl ClientConfig {
    /// Builds a config from the process environment, loading `.env` first if present.
    ///
    /// Recognised variables: `GPORTAL_BASE_URL`, `GPORTAL_USER_AGENT`,
    /// `GPORTAL_TIMEOUT_SECS`, `GPORTAL_ACCEPT_INVALID_CERTS`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(base_url) = env::var("GPORTAL_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(user_agent) = env::var("GPORTAL_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(secs) = env::var("GPORTAL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout_secs = secs;
        }
        if let Ok(flag) = env::var("GPORTAL_ACCEPT_INVALID_CERTS") {
            config.accept_invalid_certs = matches!(flag.as_str(), "1" | "true" | "yes");
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Joins a resource path onto the base URL without doubling slashes.
    ///
    /// Absolute URLs are returned unchanged.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }
}
