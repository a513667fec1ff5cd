//! Configuration management for the client.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the coupon backend, e.g. `https://api.example.com/v1`
    pub api_base_url: String,
    /// Bearer token attached to authenticated requests
    pub api_token: Option<String>,
    /// Directory for the device-local key-value store
    pub storage_dir: PathBuf,
    /// Per-request timeout for remote favorites calls
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url =
            env::var("CLIP_API_BASE_URL").map_err(|_| ConfigError::MissingApiBaseUrl)?;

        let api_token = env::var("CLIP_API_TOKEN").ok();

        let storage_dir = env::var("CLIP_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".clip"));

        let request_timeout = env::var("CLIP_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidTimeout)?;

        Ok(Self {
            api_base_url,
            api_token,
            storage_dir,
            request_timeout,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CLIP_API_BASE_URL environment variable is required")]
    MissingApiBaseUrl,

    #[error("Invalid CLIP_REQUEST_TIMEOUT_SECS value")]
    InvalidTimeout,
}
