// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # fedrti - federation runtime
//!
//! Federates exchange object updates, interactions and logical-time
//! advances through a central broker. This crate holds the federate side
//! and everything the broker shares with it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fedrti::federate::{FederateAgent, FederateConfig, NullAmbassador, WaitCondition};
//! use fedrti::{DescriptorFile, FederationTime, Result};
//!
//! fn main() -> Result<()> {
//!     let config = FederateConfig::new("127.0.0.1:60400".parse().unwrap());
//!     let agent = FederateAgent::connect(config, Box::new(NullAmbassador))?;
//!     let rti = agent.rti();
//!
//!     rti.create_federation_execution("traffic", &DescriptorFile::user("traffic.json"))?;
//!     rti.join_federation_execution("car", "traffic")?;
//!     rti.enable_time_regulation(FederationTime::new(1.0))?;
//!     rti.time_advance_request(FederationTime::new(10.0))?;
//!     rti.tick(WaitCondition::TimeAdvanceGrant)?;
//!     rti.resign_federation_execution()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |  Application: RtiAmbassador (requests) / FederateAmbassador   |
//! +---------------------------------------------------------------+
//! |  Event loop: reply matching, tick sub-mode, federate cache    |
//! +---------------------------------------------------------------+
//! |  Time management | Ownership | Data distribution bookkeeping |
//! +---------------------------------------------------------------+
//! |  Protocol: MessageKind, Payload, 32-byte header codec         |
//! +---------------------------------------------------------------+
//! |  Transport: TCP frames (reliable) | UDP datagrams (best effort)|
//! +---------------------------------------------------------------+
//! ```

pub mod ddm;
pub mod descriptor;
pub mod error;
pub mod exception;
pub mod federate;
pub mod handles;
pub mod ownership;
pub mod protocol;
pub mod time;
pub mod time_management;
pub mod transport;

pub use descriptor::DescriptorFile;
pub use error::{Result, RtiError};
pub use exception::Exception;
pub use handles::{
    AttributeHandle, FederateHandle, FederationHandle, HandleAllocator, InteractionClassHandle,
    ObjectClassHandle, ObjectHandle, ParameterHandle, RegionHandle, SpaceHandle,
};
pub use protocol::{Message, MessageKind, Payload, Rejection};
pub use time::FederationTime;
