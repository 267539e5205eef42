//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub storage_url: String,
    pub keyring_service: String,
    pub log_level: Level,
    pub request_timeout: Duration,
    pub conversation_poll_interval: Duration,
    pub notice_display_window: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Remote & Storage Settings ---
        let api_base_url = std::env::var("API_BASE_URL")
            .map_err(|_| ConfigError::MissingVar("API_BASE_URL".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let storage_url = std::env::var("STORAGE_URL")
            .unwrap_or_else(|_| "sqlite://talent_client.db?mode=rwc".to_string());

        let keyring_service =
            std::env::var("KEYRING_SERVICE").unwrap_or_else(|_| "talent-client".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Timing Settings ---
        let request_timeout = seconds_var("REQUEST_TIMEOUT_SECS", 30)?;
        let conversation_poll_interval = seconds_var("CONVERSATION_POLL_SECS", 30)?;
        let notice_display_window = seconds_var("NOTICE_DISPLAY_SECS", 5)?;

        Ok(Self {
            api_base_url,
            storage_url,
            keyring_service,
            log_level,
            request_timeout,
            conversation_poll_interval,
            notice_display_window,
        })
    }
}

fn seconds_var(name: &str, default: u64) -> Result<Duration, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => {
            let secs = raw
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue(
                    name.to_string(),
                    "must be greater than zero".to_string(),
                ));
            }
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(Duration::from_secs(default)),
    }
}
