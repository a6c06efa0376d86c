//! WaRelay Configuration System
//!
//! TOML-based configuration with environment variable override support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub bridge: BridgeConfig,
    pub connection: ConnectionConfig,
    pub dispatch: DispatchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            bridge: BridgeConfig::default(),
            connection: ConnectionConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "bridge.base_url must not be empty".to_string(),
            ));
        }
        if self.dispatch.local_number_length == 0 {
            return Err(ConfigError::ValidationError(
                "dispatch.local_number_length must be greater than zero".to_string(),
            ));
        }
        if self.dispatch.country_prefix.is_empty()
            || !self.dispatch.country_prefix.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ConfigError::ValidationError(format!(
                "dispatch.country_prefix must be numeric, got '{}'",
                self.dispatch.country_prefix
            )));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            cors_origins: vec!["http://localhost:4200".to_string()],
        }
    }
}

/// Bridge sidecar configuration (the process hosting the WhatsApp client)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base URL of the bridge HTTP API
    pub base_url: String,
    /// Shared secret for HMAC request signing (empty disables signing)
    pub api_secret: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3001".to_string(),
            api_secret: String::new(),
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
        }
    }
}

/// Connection manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Interval between bridge status polls in seconds
    pub poll_interval_secs: u64,
    /// Upper bound for the backoff delay when the bridge is unreachable
    pub max_backoff_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 3,
            max_backoff_secs: 60,
        }
    }
}

/// Dispatch engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Country prefix prepended by the recipient normalizer
    pub country_prefix: String,
    /// Digit count of a local number without the prefix
    pub local_number_length: usize,
    /// Default delay between consecutive sends in milliseconds
    pub default_interval_ms: u64,
    /// Default delay between directory probes in milliseconds
    pub probe_interval_ms: u64,
    /// Optional cap on sends per minute (0 disables)
    pub rate_limit_per_minute: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            country_prefix: "94".to_string(),
            local_number_length: 9,
            default_interval_ms: 2000,
            probe_interval_ms: 1000,
            rate_limit_per_minute: 0,
        }
    }
}
