//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use stockfeed_throttle::ThrottleConfig;
use stockfeed_ws::FeedConfig;

/// Top-level configuration for the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Auth token appended to the streaming URL. Usually supplied via
    /// the `STOCKFEED_API_TOKEN` environment variable instead.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Streaming connection settings.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Request throttling settings.
    #[serde(default)]
    pub throttle: ThrottleConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Reads the file named by `STOCKFEED_CONFIG` (default
    /// `config/default.toml`); falls back to defaults when the file
    /// does not exist. `STOCKFEED_API_TOKEN` overrides the token from
    /// the file.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("STOCKFEED_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Self::default()
        };

        if let Ok(token) = std::env::var("STOCKFEED_API_TOKEN") {
            config.api_token = Some(token);
        }

        config.throttle.validate()?;
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }
}
