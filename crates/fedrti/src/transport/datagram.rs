// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Best-effort channel: one encoded message per UDP datagram.
//!
//! Carries receive-order reflections only. Loss is tolerated and nothing
//! authoritative travels here.

use super::TransportError;
use crate::protocol::{codec, Message};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Duration;

/// Largest payload a single UDP datagram can carry.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

pub struct BestEffortChannel {
    socket: UdpSocket,
}

impl BestEffortChannel {
    /// Bind on `addr` (port 0 picks an ephemeral port).
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        log::debug!("[best-effort] bound {}", socket.local_addr()?);
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Address and port as advertised in the join header.
    pub fn advertised(&self) -> io::Result<(u32, u32)> {
        match self.socket.local_addr()? {
            SocketAddr::V4(v4) => Ok((u32::from(*v4.ip()), u32::from(v4.port()))),
            SocketAddr::V6(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "best-effort endpoint must be IPv4",
            )),
        }
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.socket.set_read_timeout(timeout)
    }

    pub fn try_clone(&self) -> io::Result<Self> {
        Ok(Self {
            socket: self.socket.try_clone()?,
        })
    }

    pub fn send_to(&self, message: &Message, target: SocketAddr) -> Result<(), TransportError> {
        let frame = codec::encode(message)?;
        if frame.len() > MAX_DATAGRAM_SIZE {
            return Err(TransportError::TooLarge {
                size: frame.len(),
                max: MAX_DATAGRAM_SIZE,
            });
        }
        self.socket.send_to(&frame, target)?;
        Ok(())
    }

    /// Block for one datagram. A datagram that does not decode is an error
    /// for that datagram only.
    pub fn recv(&self) -> Result<(Message, SocketAddr), TransportError> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let (len, from) = self.socket.recv_from(&mut buf)?;
        let message = codec::decode(&buf[..len])?;
        Ok((message, from))
    }
}

/// Rebuild the endpoint a federate advertised at join time.
pub fn advertised_endpoint(address: u32, port: u32) -> Option<SocketAddr> {
    if port == 0 || port > u32::from(u16::MAX) {
        return None;
    }
    Some(SocketAddr::V4(SocketAddrV4::new(
        Ipv4Addr::from(address),
        port as u16,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::{
        AttributeHandle, FederateHandle, FederationHandle, ObjectClassHandle, ObjectHandle,
    };
    use crate::protocol::{AttributeValues, Payload};

    fn loopback() -> BestEffortChannel {
        BestEffortChannel::bind("127.0.0.1:0".parse().unwrap()).unwrap()
    }

    #[test]
    fn test_reflect_over_datagram() {
        let receiver = loopback();
        receiver
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let sender = loopback();

        let reflect = Message::new(
            FederationHandle(1),
            FederateHandle(2),
            Payload::ReflectAttributeValues(AttributeValues {
                class: ObjectClassHandle(1),
                object: ObjectHandle(4),
                values: vec![(AttributeHandle(1), vec![1, 2, 3])],
                tag: String::new(),
                time: None,
            }),
        );
        sender
            .send_to(&reflect, receiver.local_addr().unwrap())
            .unwrap();
        let (got, from) = receiver.recv().unwrap();
        assert_eq!(got, reflect);
        assert_eq!(from, sender.local_addr().unwrap());
    }

    #[test]
    fn test_advertised_round_trip() {
        let channel = loopback();
        let (address, port) = channel.advertised().unwrap();
        assert_eq!(
            advertised_endpoint(address, port),
            Some(channel.local_addr().unwrap())
        );
        assert_eq!(advertised_endpoint(address, 0), None);
        assert_eq!(advertised_endpoint(address, 70_000), None);
    }
}
