//! Library configuration with validation.
//!
//! Every field has a sane default; a page normally never touches this.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use webeid_bus::DEFAULT_CHANNEL_CAPACITY;

/// Timing and sizing knobs for the page library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebEidConfig {
    /// How long the extension has to acknowledge a request.
    #[serde(with = "humantime_serde")]
    pub extension_handshake_timeout: Duration,

    /// Budget for the extension to reach the native application.
    #[serde(with = "humantime_serde")]
    pub native_app_handshake_timeout: Duration,

    /// Budget for one user interaction (PIN entry, certificate choice).
    /// Overridable per call.
    #[serde(with = "humantime_serde")]
    pub default_user_interaction_timeout: Duration,

    /// Budget for one server round trip. Overridable per call.
    #[serde(with = "humantime_serde")]
    pub default_server_request_timeout: Duration,

    /// Time the extension content script gets to load after the library
    /// starts, before the first request goes out.
    #[serde(with = "humantime_serde")]
    pub max_extension_load_delay: Duration,

    /// Buffer size of the in-memory page bus.
    pub bus_capacity: usize,
}

impl Default for WebEidConfig {
    fn default() -> Self {
        Self {
            extension_handshake_timeout: Duration::from_secs(1),
            native_app_handshake_timeout: Duration::from_secs(5),
            default_user_interaction_timeout: Duration::from_secs(2 * 60),
            default_server_request_timeout: Duration::from_secs(20),
            max_extension_load_delay: Duration::from_secs(1),
            bus_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl WebEidConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extension_handshake_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "extension_handshake_timeout cannot be 0".into(),
            ));
        }

        if self.native_app_handshake_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "native_app_handshake_timeout cannot be 0".into(),
            ));
        }

        if self.default_user_interaction_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "default_user_interaction_timeout cannot be 0".into(),
            ));
        }

        if self.bus_capacity == 0 {
            return Err(ConfigError::InvalidLimit("bus_capacity cannot be 0".into()));
        }

        Ok(())
    }

    /// Parse a TOML document and validate the result.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Document could not be parsed
    #[error("invalid configuration: {0}")]
    Parse(String),
}
