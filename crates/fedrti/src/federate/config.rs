// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Federate connection configuration.

use crate::descriptor::DescriptorFile;
use crate::transport::DEFAULT_MAX_MESSAGE_SIZE;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default broker command port.
pub const DEFAULT_BROKER_PORT: u16 = 60400;

/// Configuration for connecting a federate to the broker.
#[derive(Debug)]
pub struct FederateConfig {
    /// Broker address (host:port).
    pub broker_address: SocketAddr,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Bind a UDP socket and advertise it for best-effort reflections.
    pub best_effort: bool,

    /// Maximum message size accepted from the broker.
    pub max_message_size: usize,

    /// Descriptor sent when this federate creates a federation.
    pub descriptor: Option<DescriptorFile>,
}

impl Default for FederateConfig {
    fn default() -> Self {
        Self {
            broker_address: SocketAddr::new(
                IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
                DEFAULT_BROKER_PORT,
            ),
            connect_timeout: Duration::from_secs(5),
            best_effort: false,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            descriptor: None,
        }
    }
}

impl FederateConfig {
    /// Create a new configuration with the given broker address.
    pub fn new(broker_address: SocketAddr) -> Self {
        Self {
            broker_address,
            ..Default::default()
        }
    }

    /// Builder: set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Builder: enable the best-effort channel.
    pub fn with_best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    /// Builder: set max message size.
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Builder: set the federation descriptor.
    pub fn with_descriptor(mut self, descriptor: DescriptorFile) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.connect_timeout.is_zero() {
            return Err("connect_timeout must be > 0");
        }
        if self.max_message_size < crate::protocol::HEADER_SIZE {
            return Err("max_message_size must hold at least a header");
        }
        if self.broker_address.port() == 0 {
            return Err("broker port must be > 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FederateConfig::default();
        assert_eq!(config.broker_address.port(), 60400);
        assert!(!config.best_effort);
        assert!(config.descriptor.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let addr: SocketAddr = "10.0.0.2:61000".parse().unwrap();
        let config = FederateConfig::new(addr)
            .with_connect_timeout(Duration::from_secs(1))
            .with_best_effort()
            .with_max_message_size(4096)
            .with_descriptor(DescriptorFile::user("/tmp/model.json"));

        assert_eq!(config.broker_address, addr);
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert!(config.best_effort);
        assert_eq!(config.max_message_size, 4096);
        assert!(!config.descriptor.as_ref().unwrap().is_owned());
    }

    #[test]
    fn test_validation_errors() {
        let config = FederateConfig::default().with_connect_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = FederateConfig::default().with_max_message_size(8);
        assert!(config.validate().is_err());

        let config = FederateConfig::new("127.0.0.1:0".parse().unwrap());
        assert!(config.validate().is_err());
    }
}
