// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Outbound routing.
//!
//! Every connection task registers an unbounded channel here. The registry's
//! output is pushed through [`ConnectionRouter::deliver`] while the registry
//! lock is held, so each connection sees messages in registry order.
//!
//! Receive-order reflections for a federate that advertised a best-effort
//! endpoint go out as UDP datagrams when the broker has a UDP socket.

use fedrti::protocol::{codec, Message};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Broker-local identifier of an accepted connection.
pub type ConnectionId = u64;

/// Routing statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RouterStats {
    /// Messages queued on a connection channel.
    pub messages_routed: u64,
    /// Messages sent as datagrams.
    pub datagrams_sent: u64,
    /// Destination gone or datagram send failed.
    pub route_errors: u64,
}

struct ConnectionHandle {
    tx: UnboundedSender<Message>,
    best_effort: Option<SocketAddr>,
}

pub struct ConnectionRouter {
    connections: HashMap<ConnectionId, ConnectionHandle>,
    udp: Option<Arc<UdpSocket>>,
    stats: RouterStats,
}

impl ConnectionRouter {
    pub fn new(udp: Option<Arc<UdpSocket>>) -> Self {
        Self {
            connections: HashMap::new(),
            udp,
            stats: RouterStats::default(),
        }
    }

    pub fn register(&mut self, connection: ConnectionId, tx: UnboundedSender<Message>) {
        self.connections.insert(
            connection,
            ConnectionHandle {
                tx,
                best_effort: None,
            },
        );
    }

    pub fn unregister(&mut self, connection: ConnectionId) {
        self.connections.remove(&connection);
    }

    /// Record the datagram endpoint a federate advertised at join.
    pub fn set_best_effort(&mut self, connection: ConnectionId, endpoint: Option<SocketAddr>) {
        if let Some(handle) = self.connections.get_mut(&connection) {
            handle.best_effort = endpoint;
        }
    }

    pub fn best_effort(&self, connection: ConnectionId) -> Option<SocketAddr> {
        self.connections
            .get(&connection)
            .and_then(|handle| handle.best_effort)
    }

    /// Route one message. `best_effort` marks it eligible for the datagram
    /// channel; it falls back to the reliable channel otherwise.
    ///
    /// Returns `false` if the connection is gone.
    pub fn deliver(&mut self, connection: ConnectionId, message: Message, best_effort: bool) -> bool {
        let Some(handle) = self.connections.get(&connection) else {
            self.stats.route_errors += 1;
            return false;
        };

        if best_effort {
            if let (Some(udp), Some(target)) = (&self.udp, handle.best_effort) {
                match codec::encode(&message) {
                    Ok(frame) => match udp.try_send_to(&frame, target) {
                        Ok(_) => {
                            self.stats.datagrams_sent += 1;
                            return true;
                        }
                        Err(e) => {
                            debug!("Datagram to {} failed ({}), using stream", target, e);
                            self.stats.route_errors += 1;
                        }
                    },
                    Err(e) => {
                        debug!("Datagram encode failed ({}), using stream", e);
                    }
                }
            }
        }

        if handle.tx.send(message).is_ok() {
            self.stats.messages_routed += 1;
            true
        } else {
            self.stats.route_errors += 1;
            false
        }
    }

    pub fn stats(&self) -> &RouterStats {
        &self.stats
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn has_udp(&self) -> bool {
        self.udp.is_some()
    }
}

impl Default for ConnectionRouter {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedrti::{FederateHandle, FederationHandle, Payload};
    use tokio::sync::mpsc;

    fn message() -> Message {
        Message::new(
            FederationHandle(1),
            FederateHandle(2),
            Payload::FederationSaved,
        )
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let mut router = ConnectionRouter::default();
        let (tx, _rx) = mpsc::unbounded_channel();
        router.register(7, tx);
        assert_eq!(router.connection_count(), 1);
        router.unregister(7);
        assert_eq!(router.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_deliver_in_order() {
        let mut router = ConnectionRouter::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        router.register(1, tx);

        assert!(router.deliver(1, message(), false));
        assert!(router.deliver(
            1,
            Message::new(FederationHandle(1), FederateHandle(2), Payload::FederationNotSaved),
            false
        ));
        assert_eq!(rx.recv().await.unwrap().payload(), Some(&Payload::FederationSaved));
        assert_eq!(
            rx.recv().await.unwrap().payload(),
            Some(&Payload::FederationNotSaved)
        );
        assert_eq!(router.stats().messages_routed, 2);
    }

    #[tokio::test]
    async fn test_deliver_unknown_connection() {
        let mut router = ConnectionRouter::default();
        assert!(!router.deliver(9, message(), false));
        assert_eq!(router.stats().route_errors, 1);
    }

    #[tokio::test]
    async fn test_best_effort_without_socket_uses_stream() {
        let mut router = ConnectionRouter::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        router.register(1, tx);
        router.set_best_effort(1, Some("127.0.0.1:9".parse().unwrap()));

        assert!(router.deliver(1, message(), true));
        assert!(rx.recv().await.is_some());
        assert_eq!(router.stats().datagrams_sent, 0);
    }

    #[tokio::test]
    async fn test_best_effort_datagram() {
        let udp = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut router = ConnectionRouter::new(Some(udp));
        let (tx, mut rx) = mpsc::unbounded_channel();
        router.register(1, tx);
        router.set_best_effort(1, Some(receiver.local_addr().unwrap()));

        assert!(router.deliver(1, message(), true));
        let mut buf = vec![0u8; 1024];
        let len = receiver.recv(&mut buf).await.unwrap();
        assert_eq!(codec::decode(&buf[..len]).unwrap(), message());
        assert!(rx.try_recv().is_err());
        assert_eq!(router.stats().datagrams_sent, 1);
    }
}
