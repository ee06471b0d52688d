// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message framing over a byte stream.
//!
//! The codec header already carries the body length, so a frame is exactly
//! one encoded message:
//!
//! ```text
//! +----------------------+---------------------+
//! | header (32B)         | body (body_len B)   |
//! +----------------------+---------------------+
//! ```
//!
//! `send` writes the whole frame or fails. `receive` returns a complete
//! message or [`TransportError::Closed`]; a partially read frame is never
//! surfaced.

use super::TransportError;
use crate::protocol::codec::{self, HEADER_SIZE};
use crate::protocol::Message;
use std::io::{self, Read, Write};
use std::net::TcpStream;

/// Encode and write one message.
pub fn send<W: Write + ?Sized>(writer: &mut W, message: &Message) -> Result<(), TransportError> {
    let frame = codec::encode(message)?;
    writer
        .write_all(&frame)
        .and_then(|_| writer.flush())
        .map_err(TransportError::from_read)?;
    log::trace!("[frame] sent {} ({} bytes)", message.kind(), frame.len());
    Ok(())
}

/// Block until one complete message has been read.
pub fn receive<R: Read + ?Sized>(
    reader: &mut R,
    max_message_size: usize,
) -> Result<Message, TransportError> {
    let mut raw = [0u8; HEADER_SIZE];
    reader
        .read_exact(&mut raw)
        .map_err(TransportError::from_read)?;
    let header = codec::decode_header(&raw)?;

    let body_len = header.body_len();
    if HEADER_SIZE + body_len > max_message_size {
        return Err(TransportError::TooLarge {
            size: HEADER_SIZE + body_len,
            max: max_message_size,
        });
    }

    let mut body = vec![0u8; body_len];
    reader
        .read_exact(&mut body)
        .map_err(TransportError::from_read)?;
    let message = codec::decode_body(&header, &body)?;
    log::trace!("[frame] received {} ({} bytes)", header.kind(), body_len);
    Ok(message)
}

/// Non-blocking poll: `Ok(None)` when no byte is waiting.
///
/// Once the first byte of a frame is available the rest is read blocking.
pub fn try_receive(
    stream: &mut TcpStream,
    max_message_size: usize,
) -> Result<Option<Message>, TransportError> {
    stream.set_nonblocking(true)?;
    let mut byte = [0u8; 1];
    let peeked = stream.peek(&mut byte);
    stream.set_nonblocking(false)?;
    match peeked {
        Ok(0) => Err(TransportError::Closed),
        Ok(_) => receive(stream, max_message_size).map(Some),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(e) => Err(TransportError::from_read(e)),
    }
}
