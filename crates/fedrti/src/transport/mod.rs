// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Federate-side transport.
//!
//! - [`frame`]: reliable ordered channel (TCP), one message per frame
//! - [`datagram`]: optional best-effort channel (UDP), one message per datagram

pub mod datagram;
pub mod frame;

use crate::protocol::{DecodeError, EncodeError};
use std::io;
use thiserror::Error;

pub use datagram::BestEffortChannel;
pub use frame::{receive, send, try_receive};

/// Default maximum frame size (16 MB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Peer closed the channel. Never retried.
    #[error("channel closed")]
    Closed,

    #[error("frame of {size} bytes exceeds limit of {max}")]
    TooLarge { size: usize, max: usize },

    #[error("decode: {0}")]
    Decode(#[from] DecodeError),

    #[error("encode: {0}")]
    Encode(#[from] EncodeError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    pub(crate) fn from_read(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => TransportError::Closed,
            _ => TransportError::Io(err),
        }
    }
}
