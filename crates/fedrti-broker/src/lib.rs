// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # fedrti-broker
//!
//! Central broker of a federation runtime. Federates connect over TCP; the
//! broker keeps the authoritative federation registry (membership, class
//! model, declarations, object instances, attribute ownership, logical-time
//! regulators, synchronization points, save/restore phases) and routes
//! every update and event to the federates it concerns.
//!
//! ```rust,no_run
//! use fedrti_broker::{Broker, BrokerConfig};
//!
//! # async fn start() -> Result<(), Box<dyn std::error::Error>> {
//! let broker = Broker::bind(BrokerConfig::default()).await?;
//! broker.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod server;

pub use config::{BrokerConfig, ConfigError};
pub use server::{Broker, ServerError};
