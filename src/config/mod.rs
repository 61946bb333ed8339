//! Configuration for the Peerlink client.
//!
//! Loads client settings from TOML files into a structured representation
//! with per-field defaults, so a partial (or absent) file still yields a
//! usable configuration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connection::ConnectConfig;
use std::time::Duration;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),

    /// Error parsing TOML configuration
    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration file not found
    #[error("configuration file not found at {0}")]
    FileNotFound(PathBuf),

    /// Invalid configuration value
    #[error("invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Key whose value is invalid
        key: String,
        /// What is wrong with it
        message: String,
    },
}

/// Per-stage connect timeouts, in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectTimeouts {
    /// Budget for proposal lookup (default: 30)
    #[serde(default = "default_stage_secs")]
    pub proposal_secs: u64,

    /// Budget for dialog establishment (default: 30)
    #[serde(default = "default_stage_secs")]
    pub dialog_secs: u64,

    /// Budget for session negotiation (default: 30)
    #[serde(default = "default_stage_secs")]
    pub negotiation_secs: u64,

    /// Budget for issuing tunnel start (default: 30)
    #[serde(default = "default_stage_secs")]
    pub tunnel_start_secs: u64,
}

fn default_stage_secs() -> u64 {
    30
}

impl Default for ConnectTimeouts {
    fn default() -> Self {
        ConnectTimeouts {
            proposal_secs: default_stage_secs(),
            dialog_secs: default_stage_secs(),
            negotiation_secs: default_stage_secs(),
            tunnel_start_secs: default_stage_secs(),
        }
    }
}

impl ConnectTimeouts {
    /// Convert into the connection manager's stage budgets.
    pub fn to_connect_config(&self) -> ConnectConfig {
        ConnectConfig::new()
            .with_proposal_timeout(Duration::from_secs(self.proposal_secs))
            .with_dialog_timeout(Duration::from_secs(self.dialog_secs))
            .with_negotiation_timeout(Duration::from_secs(self.negotiation_secs))
            .with_tunnel_start_timeout(Duration::from_secs(self.tunnel_start_secs))
    }
}

/// Client configuration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Log level: trace, debug, info, warn or error (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Connect stage timeouts
    #[serde(default)]
    pub connect: ConnectTimeouts,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            log_level: default_log_level(),
            connect: ConnectTimeouts::default(),
        }
    }
}

impl ClientConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "log_level".to_string(),
                    message: format!("unknown level '{}'", other),
                });
            }
        }

        let stages = [
            ("connect.proposal_secs", self.connect.proposal_secs),
            ("connect.dialog_secs", self.connect.dialog_secs),
            ("connect.negotiation_secs", self.connect.negotiation_secs),
            ("connect.tunnel_start_secs", self.connect.tunnel_start_secs),
        ];
        for (key, value) in stages {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "timeout must be greater than zero".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.connect.proposal_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            log_level = "debug"

            [connect]
            proposal_secs = 10
            dialog_secs = 20
            negotiation_secs = 15
            tunnel_start_secs = 25
        "#;

        let config = ClientConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.connect.negotiation_secs, 15);

        let connect = config.connect.to_connect_config();
        assert_eq!(connect.proposal_timeout, Duration::from_secs(10));
        assert_eq!(connect.tunnel_start_timeout, Duration::from_secs(25));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = ClientConfig::from_toml_str("log_level = \"warn\"").unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.connect.dialog_secs, 30);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let result = ClientConfig::from_toml_str("log_level = \"loud\"");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "log_level"
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = ClientConfig::from_toml_str("[connect]\nproposal_secs = 0");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"error\"").unwrap();

        let config = ClientConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.log_level, "error");
    }

    #[test]
    fn test_missing_file() {
        let result = ClientConfig::load_from_file("/nonexistent/peerlink.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
