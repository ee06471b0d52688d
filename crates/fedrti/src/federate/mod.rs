// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Federate side: connection, event loop and application API.

pub mod ambassador;
pub mod cache;
pub mod config;
pub mod event_loop;
pub mod rti;

pub use ambassador::{Callback, FederateAmbassador, NullAmbassador};
pub use cache::{CachedObject, FederateCache, Switches};
pub use config::{FederateConfig, DEFAULT_BROKER_PORT};
pub use event_loop::{EventLoop, Inbound, Operation, Request, Response, TickOutcome, WaitCondition};
pub use rti::{FederateAgent, RtiAmbassador};
