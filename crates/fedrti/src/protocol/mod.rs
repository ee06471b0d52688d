// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Coordination protocol.
//!
//! Every federate/broker exchange is one [`Message`]: a closed
//! [`MessageKind`], the federation and federate handles, and either a
//! kind-specific [`Payload`] or a [`Rejection`]. [`codec`] maps messages to
//! frames.

pub mod codec;
pub mod cursor;
pub mod kind;
pub mod message;

pub use codec::{decode, encode, DecodeError, EncodeError, Header, HEADER_SIZE};
pub use kind::MessageKind;
pub use message::{
    AttributeValues, InteractionValues, Message, ObjectAttributes, Payload, Rejection,
    TaggedObjectAttributes,
};
