// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Federate connection handling for the broker.
//!
//! A connection is split in two halves: the reader decodes frames for the
//! registry, the writer drains the connection's outbound channel. Reads are
//! never raced against writes, so a partially read frame is never dropped.

use fedrti::protocol::{codec, DecodeError, EncodeError, Message, HEADER_SIZE};
use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] DecodeError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Frame too large: {size} > {max}")]
    TooLarge { size: usize, max: usize },
}

/// A connected federate.
pub struct ClientConnection {
    stream: TcpStream,
    peer_addr: SocketAddr,
    max_message_size: usize,
}

impl ClientConnection {
    pub fn new(stream: TcpStream, peer_addr: SocketAddr, max_message_size: usize) -> Self {
        Self {
            stream,
            peer_addr,
            max_message_size,
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn split(self) -> (FrameReader, FrameWriter) {
        let (read, write) = self.stream.into_split();
        (
            FrameReader {
                stream: read,
                max_message_size: self.max_message_size,
                body: Vec::with_capacity(4096),
            },
            FrameWriter {
                stream: write,
                max_message_size: self.max_message_size,
            },
        )
    }
}

pub struct FrameReader {
    stream: OwnedReadHalf,
    max_message_size: usize,
    body: Vec<u8>,
}

impl FrameReader {
    /// Read one message.
    ///
    /// Returns `Ok(None)` if the peer closed the connection between frames.
    pub async fn read_message(&mut self) -> Result<Option<Message>, ConnectionError> {
        let mut raw = [0u8; HEADER_SIZE];
        match self.stream.read_exact(&mut raw).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let header = codec::decode_header(&raw)?;
        let size = HEADER_SIZE + header.body_len();
        if size > self.max_message_size {
            return Err(ConnectionError::TooLarge {
                size,
                max: self.max_message_size,
            });
        }

        self.body.clear();
        self.body.resize(header.body_len(), 0);
        self.stream.read_exact(&mut self.body).await?;
        Ok(Some(codec::decode_body(&header, &self.body)?))
    }
}

pub struct FrameWriter {
    stream: OwnedWriteHalf,
    max_message_size: usize,
}

impl FrameWriter {
    pub async fn send_message(&mut self, message: &Message) -> Result<(), ConnectionError> {
        let frame = codec::encode(message)?;
        if frame.len() > self.max_message_size {
            return Err(ConnectionError::TooLarge {
                size: frame.len(),
                max: self.max_message_size,
            });
        }
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), ConnectionError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedrti::{FederateHandle, FederationHandle, Payload};
    use tokio::net::TcpListener;

    async fn pair(max: usize) -> (ClientConnection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, peer) = listener.accept().await.unwrap();
        (ClientConnection::new(server, peer, max), client)
    }

    #[tokio::test]
    async fn test_read_write_messages() {
        let (connection, mut client) = pair(1 << 20).await;
        let (mut reader, mut writer) = connection.split();

        let request = Message::new(
            FederationHandle(1),
            FederateHandle(2),
            Payload::SynchronizationPointAchieved {
                label: "ready".into(),
            },
        );
        client
            .write_all(&codec::encode(&request).unwrap())
            .await
            .unwrap();
        assert_eq!(reader.read_message().await.unwrap(), Some(request));

        let reply = Message::new(FederationHandle(1), FederateHandle(2), Payload::FederationSaved);
        writer.send_message(&reply).await.unwrap();
        let mut raw = vec![0u8; HEADER_SIZE];
        client.read_exact(&mut raw).await.unwrap();
        assert_eq!(codec::decode(&raw).unwrap(), reply);
    }

    #[tokio::test]
    async fn test_eof_between_frames() {
        let (connection, client) = pair(1 << 20).await;
        let (mut reader, _writer) = connection.split();
        drop(client);
        assert!(reader.read_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (connection, mut client) = pair(HEADER_SIZE + 4).await;
        let (mut reader, _writer) = connection.split();
        let request = Message::new(
            FederationHandle(1),
            FederateHandle(2),
            Payload::SynchronizationPointAchieved {
                label: "a label longer than four bytes".into(),
            },
        );
        client
            .write_all(&codec::encode(&request).unwrap())
            .await
            .unwrap();
        assert!(matches!(
            reader.read_message().await,
            Err(ConnectionError::TooLarge { .. })
        ));
    }
}
