//! Configuration management for the provider.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default Slack Web API base URL.
pub const DEFAULT_API_URL: &str = "https://slack.com/api";

/// Provider configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// OAuth token used for every Slack call
    pub slack_token: String,
    /// Slack Web API base URL
    pub api_url: String,
    /// Per-request timeout for Slack calls
    pub request_timeout: Duration,
    /// Root directory of the response cache
    pub cache_dir: PathBuf,
    /// Shared secret the orchestrator must present, if set
    pub auth_secret: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let slack_token = lookup("SLACK_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let api_url = lookup("SLACK_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs: u64 = lookup("SLACK_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidTimeout)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let cache_dir = lookup("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".cache/convoy"));

        let auth_secret = lookup("AUTH_SECRET").filter(|s| !s.is_empty());

        Ok(Self {
            host,
            port,
            slack_token,
            api_url,
            request_timeout: Duration::from_secs(timeout_secs),
            cache_dir,
            auth_secret,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SLACK_TOKEN environment variable is required")]
    MissingToken,

    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Invalid SLACK_TIMEOUT_SECS value")]
    InvalidTimeout,
}
