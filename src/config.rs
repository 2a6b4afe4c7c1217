//! Configuration module for the spyglass exporter.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (port, bind address)
//! - Upstream settings (base URL, call timeout)
//! - Metric namespace prefix

use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collector::{UpstreamConfig, DEFAULT_NAMESPACE};

/// Default exporter listen port.
pub const DEFAULT_PORT: u16 = 9000;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 9000).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Web server configuration.
    pub server: ServerConfig,

    /// Upstream server to probe on each scrape.
    pub upstream: UpstreamConfig,

    /// Prefix applied to every exported metric family name.
    pub namespace: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::Validation(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server port must be non-zero".to_string(),
            ));
        }

        reqwest::Url::parse(&self.upstream.base_url).map_err(|e| {
            ConfigError::Validation(format!(
                "invalid upstream base URL '{}': {}",
                self.upstream.base_url, e
            ))
        })?;

        if self.upstream.timeout.is_zero() {
            return Err(ConfigError::Validation(
                "upstream timeout must be non-zero".to_string(),
            ));
        }

        validate_namespace(&self.namespace)?;

        Ok(())
    }
}

/// Check that the namespace is usable as a metric name prefix.
fn validate_namespace(namespace: &str) -> Result<(), ConfigError> {
    let mut chars = namespace.chars();

    let valid = match chars.next() {
        None => false,
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
    };

    if valid {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "invalid metric namespace: '{namespace}'"
        )))
    }
}
