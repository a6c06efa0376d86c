//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "warelay.toml",
    "./config/config.toml",
    "/etc/warelay/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        self.apply_env_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Ok(path) = env::var("WARELAY_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        for path in CONFIG_PATHS {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&self, config: &mut AppConfig) {
        // HTTP
        if let Ok(val) = env::var("WARELAY_HTTP_PORT") {
            if let Ok(port) = val.parse() {
                config.http.port = port;
            }
        }
        if let Ok(val) = env::var("WARELAY_HTTP_HOST") {
            config.http.host = val;
        }
        if let Ok(val) = env::var("WARELAY_CORS_ORIGINS") {
            config.http.cors_origins = val.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Bridge
        if let Ok(val) = env::var("WARELAY_BRIDGE_URL") {
            config.bridge.base_url = val;
        }
        if let Ok(val) = env::var("WARELAY_BRIDGE_SECRET") {
            config.bridge.api_secret = val;
        }
        if let Ok(val) = env::var("WARELAY_BRIDGE_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.bridge.request_timeout_secs = secs;
            }
        }

        // Connection
        if let Ok(val) = env::var("WARELAY_POLL_INTERVAL_SECS") {
            if let Ok(secs) = val.parse() {
                config.connection.poll_interval_secs = secs;
            }
        }
        if let Ok(val) = env::var("WARELAY_MAX_BACKOFF_SECS") {
            if let Ok(secs) = val.parse() {
                config.connection.max_backoff_secs = secs;
            }
        }

        // Dispatch
        if let Ok(val) = env::var("WARELAY_COUNTRY_PREFIX") {
            config.dispatch.country_prefix = val;
        }
        if let Ok(val) = env::var("WARELAY_LOCAL_NUMBER_LENGTH") {
            if let Ok(len) = val.parse() {
                config.dispatch.local_number_length = len;
            }
        }
        if let Ok(val) = env::var("WARELAY_SEND_INTERVAL_MS") {
            if let Ok(ms) = val.parse() {
                config.dispatch.default_interval_ms = ms;
            }
        }
        if let Ok(val) = env::var("WARELAY_RATE_LIMIT_PER_MINUTE") {
            if let Ok(limit) = val.parse() {
                config.dispatch.rate_limit_per_minute = limit;
            }
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
