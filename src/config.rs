//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

/// Fixed trial allotment: one hour, in seconds.
pub const TRIAL_ALLOTMENT_SECS: u64 = 3600;

/// Literal prefix every activation code starts with.
pub const ACTIVATION_CODE_PREFIX: &str = "MSH";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the exam backend API
    pub backend_url: String,
    /// Directory for the durable cache (None = in-memory only)
    pub cache_dir: Option<PathBuf>,
    /// Debounce window for the sync agent, in seconds
    pub sync_debounce_secs: u64,
    /// How often the trial clock persists and pushes elapsed time, in seconds
    pub persist_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            backend_url: env::var("MSHPREP_BACKEND_URL")
                .map_err(|_| ConfigError::Missing("MSHPREP_BACKEND_URL"))?,
            cache_dir: Some(PathBuf::from(
                env::var("MSHPREP_CACHE_DIR").unwrap_or_else(|_| ".mshprep-cache".to_string()),
            )),
            sync_debounce_secs: env::var("MSHPREP_SYNC_DEBOUNCE_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            persist_interval_secs: env::var("MSHPREP_PERSIST_INTERVAL_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            backend_url: "http://localhost:8080".to_string(),
            cache_dir: None,
            sync_debounce_secs: 5,
            persist_interval_secs: 30,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
