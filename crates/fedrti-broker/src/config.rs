// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Broker configuration.

use fedrti::federate::config::DEFAULT_BROKER_PORT;
use fedrti::protocol::HEADER_SIZE;
use fedrti::transport::DEFAULT_MAX_MESSAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Broker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Address to bind to (default: 0.0.0.0)
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// TCP command port (default: 60400, 0 picks an ephemeral port)
    #[serde(default = "default_port")]
    pub port: u16,

    /// UDP port for best-effort reflections, disabled when absent
    #[serde(default)]
    pub udp_port: Option<u16>,

    /// Maximum frame size (bytes)
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,

    /// Directories searched for federation descriptors
    #[serde(default)]
    pub descriptor_paths: Vec<PathBuf>,

    /// Append audit records as JSON lines to this file
    #[serde(default)]
    pub audit_file: Option<PathBuf>,
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    DEFAULT_BROKER_PORT
}

fn default_max_message_size() -> usize {
    DEFAULT_MAX_MESSAGE_SIZE
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            udp_port: None,
            max_message_size: default_max_message_size(),
            descriptor_paths: Vec::new(),
            audit_file: None,
        }
    }
}

impl BrokerConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_size <= HEADER_SIZE {
            return Err(ConfigError::InvalidValue(format!(
                "max_message_size must exceed the {}-byte header",
                HEADER_SIZE
            )));
        }
        if let Some(udp_port) = self.udp_port {
            if udp_port != 0 && udp_port == self.port {
                return Err(ConfigError::InvalidValue(
                    "udp_port must differ from port".into(),
                ));
            }
        }
        if self.descriptor_paths.iter().any(|p| p.as_os_str().is_empty()) {
            return Err(ConfigError::InvalidValue(
                "descriptor_paths cannot contain an empty path".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Serialize error: {0}")]
    Serialize(serde_json::Error),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrokerConfig::default();
        assert_eq!(config.port, 60400);
        assert!(config.udp_port.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broker.json");
        std::fs::write(&path, r#"{ "port": 61000, "descriptor_paths": ["/opt/feds"] }"#).unwrap();

        let config = BrokerConfig::from_file(&path).unwrap();
        assert_eq!(config.port, 61000);
        assert_eq!(config.descriptor_paths, vec![PathBuf::from("/opt/feds")]);
        assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broker.json");
        let config = BrokerConfig {
            udp_port: Some(60401),
            audit_file: Some(dir.path().join("audit.jsonl")),
            ..Default::default()
        };
        config.to_file(&path).unwrap();
        assert_eq!(BrokerConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broker.json");
        std::fs::write(&path, "{ port: ").unwrap();
        assert!(matches!(
            BrokerConfig::from_file(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validation() {
        let tiny = BrokerConfig {
            max_message_size: HEADER_SIZE,
            ..Default::default()
        };
        assert!(tiny.validate().is_err());

        let clash = BrokerConfig {
            udp_port: Some(60400),
            ..Default::default()
        };
        assert!(clash.validate().is_err());

        let ephemeral = BrokerConfig {
            port: 0,
            udp_port: Some(0),
            ..Default::default()
        };
        assert!(ephemeral.validate().is_ok());
    }
}
