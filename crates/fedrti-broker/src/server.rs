// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Broker core implementation.

use crate::config::BrokerConfig;
use fedrti::transport::datagram::advertised_endpoint;
use fedrti::{Message, MessageKind, Payload};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::{mpsc, Mutex, Notify, RwLock};
use tracing::{debug, error, info, warn};

pub mod audit;
pub mod connection;
pub mod federation;
pub mod model;
pub mod registry;
pub mod router;

pub use audit::{AuditRecord, AuditSink, FileAudit, MemoryAudit, TracingAudit};
pub use connection::ClientConnection;
pub use federation::{Federation, Phase};
pub use model::{ClassModel, DescriptorLoader, InMemoryLoader, JsonDescriptorLoader};
pub use registry::{Delivery, FederationsList, RegistryStats};
pub use router::{ConnectionId, ConnectionRouter, RouterStats};

/// Federation broker: accepts federate connections and serialises every
/// request through one [`FederationsList`].
#[derive(Clone)]
pub struct Broker {
    config: Arc<BrokerConfig>,
    registry: Arc<RwLock<FederationsList>>,
    router: Arc<RwLock<ConnectionRouter>>,
    listener: Arc<Mutex<Option<TcpListener>>>,
    local_addr: SocketAddr,
    udp_addr: Option<SocketAddr>,
    shutdown: Arc<Notify>,
    running: Arc<AtomicBool>,
    next_connection: Arc<AtomicU64>,
}

impl Broker {
    /// Bind the broker sockets. Descriptors are read from the configured
    /// search paths; audit goes to the configured file or to the log.
    pub async fn bind(config: BrokerConfig) -> Result<Self, ServerError> {
        let loader = JsonDescriptorLoader::new(config.descriptor_paths.clone());
        let audit: Arc<dyn AuditSink> = match &config.audit_file {
            Some(path) => Arc::new(FileAudit::open(path)?),
            None => Arc::new(TracingAudit),
        };
        Self::bind_with(config, Box::new(loader), audit).await
    }

    /// Bind with an explicit descriptor loader and audit sink.
    pub async fn bind_with(
        config: BrokerConfig,
        loader: Box<dyn DescriptorLoader>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        let addr = SocketAddr::new(config.bind_address, config.port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("{}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;

        let udp = match config.udp_port {
            Some(port) => {
                let addr = SocketAddr::new(config.bind_address, port);
                let socket = UdpSocket::bind(addr)
                    .await
                    .map_err(|e| ServerError::Bind(format!("{}: {}", addr, e)))?;
                Some(Arc::new(socket))
            }
            None => None,
        };
        let udp_addr = match &udp {
            Some(socket) => Some(socket.local_addr()?),
            None => None,
        };

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(RwLock::new(FederationsList::new(loader, audit))),
            router: Arc::new(RwLock::new(ConnectionRouter::new(udp))),
            listener: Arc::new(Mutex::new(Some(listener))),
            local_addr,
            udp_addr,
            shutdown: Arc::new(Notify::new()),
            running: Arc::new(AtomicBool::new(false)),
            next_connection: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Command port address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Best-effort datagram address, if enabled.
    pub fn udp_addr(&self) -> Option<SocketAddr> {
        self.udp_addr
    }

    /// Accept connections until [`Broker::shutdown`] is called.
    pub async fn run(&self) -> Result<(), ServerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ServerError::AlreadyRunning);
        }
        let Some(listener) = self.listener.lock().await.take() else {
            self.running.store(false, Ordering::SeqCst);
            return Err(ServerError::AlreadyRunning);
        };

        info!("Broker listening on {}", self.local_addr);

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let id = self.next_connection.fetch_add(1, Ordering::Relaxed);
                            info!("New connection {} from {}", id, peer_addr);

                            let broker = self.clone();
                            tokio::spawn(async move {
                                if let Err(e) = broker.handle_connection(id, stream, peer_addr).await {
                                    warn!("Connection error from {}: {}", peer_addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = self.shutdown.notified() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn handle_connection(
        &self,
        id: ConnectionId,
        stream: TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<(), ServerError> {
        stream.set_nodelay(true)?;
        let (mut reader, mut writer) =
            ClientConnection::new(stream, peer_addr, self.config.max_message_size).split();

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        self.router.write().await.register(id, outbound_tx);

        let writer_task = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if let Err(e) = writer.send_message(&message).await {
                    warn!("Failed to send {} to {}: {}", message.kind(), peer_addr, e);
                    break;
                }
            }
            if let Err(e) = writer.shutdown().await {
                debug!("Shutdown of {} failed: {}", peer_addr, e);
            }
        });

        loop {
            tokio::select! {
                result = reader.read_message() => {
                    match result {
                        Ok(Some(message)) => {
                            let closing = message.kind() == MessageKind::CloseConnexion;
                            self.process_message(id, peer_addr, message).await;
                            if closing {
                                info!("Connection {} closed by federate", id);
                                break;
                            }
                        }
                        Ok(None) => {
                            info!("Connection closed: {}", peer_addr);
                            break;
                        }
                        Err(e) => {
                            warn!("Read error from {}: {}", peer_addr, e);
                            break;
                        }
                    }
                }
                _ = self.shutdown.notified() => {
                    debug!("Connection handler shutting down: {}", peer_addr);
                    break;
                }
            }
        }

        // Remove the federate if it never resigned
        {
            let mut registry = self.registry.write().await;
            let deliveries = registry.disconnect(id);
            let mut router = self.router.write().await;
            router.unregister(id);
            for delivery in deliveries {
                router.deliver(delivery.connection, delivery.message, delivery.best_effort);
            }
        }

        if let Err(e) = writer_task.await {
            debug!("Writer task for {} ended abnormally: {}", peer_addr, e);
        }
        Ok(())
    }

    /// Run one request through the registry and route its output.
    async fn process_message(&self, id: ConnectionId, peer_addr: SocketAddr, message: Message) {
        let endpoint = match message.payload() {
            Some(Payload::JoinFederationExecution {
                best_effort_address,
                best_effort_peer,
                ..
            }) => advertised_endpoint(*best_effort_address, *best_effort_peer).map(|mut endpoint| {
                if *best_effort_address == 0 {
                    endpoint.set_ip(peer_addr.ip());
                }
                endpoint
            }),
            _ => None,
        };

        let mut registry = self.registry.write().await;
        let was_member = registry.membership(id).is_some();
        let deliveries = registry.process(id, message);

        let mut router = self.router.write().await;
        if !was_member && registry.membership(id).is_some() && endpoint.is_some() {
            debug!("Connection {} receives best-effort traffic on {:?}", id, endpoint);
            router.set_best_effort(id, endpoint);
        }
        for delivery in deliveries {
            if !router.deliver(delivery.connection, delivery.message, delivery.best_effort) {
                debug!("Connection {} gone, message dropped", delivery.connection);
            }
        }
    }

    /// Signal the server to shutdown.
    pub async fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }

    /// Check if server is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of live federations.
    pub async fn federation_count(&self) -> usize {
        self.registry.read().await.federation_count()
    }

    pub async fn registry_stats(&self) -> RegistryStats {
        self.registry.read().await.stats().clone()
    }

    pub async fn router_stats(&self) -> RouterStats {
        self.router.read().await.stats().clone()
    }

    /// Number of open connections.
    pub async fn connection_count(&self) -> usize {
        self.router.read().await.connection_count()
    }
}

/// Server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bind error: {0}")]
    Bind(String),

    #[error("Server already running")]
    AlreadyRunning,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection error: {0}")]
    Connection(#[from] connection::ConnectionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_ephemeral() {
        let config = BrokerConfig {
            bind_address: "127.0.0.1".parse().unwrap(),
            port: 0,
            udp_port: Some(0),
            ..Default::default()
        };
        let broker = Broker::bind(config).await.unwrap();
        assert_ne!(broker.local_addr().port(), 0);
        assert!(broker.udp_addr().is_some());
        assert!(!broker.is_running());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = BrokerConfig {
            port: 0,
            max_message_size: 8,
            ..Default::default()
        };
        assert!(matches!(
            Broker::bind(config).await,
            Err(ServerError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_run_and_shutdown() {
        let config = BrokerConfig {
            bind_address: "127.0.0.1".parse().unwrap(),
            port: 0,
            ..Default::default()
        };
        let broker = Broker::bind(config).await.unwrap();
        let handle = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.run().await })
        };

        for _ in 0..100 {
            if broker.is_running() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert!(broker.is_running());
        assert!(matches!(broker.run().await, Err(ServerError::AlreadyRunning)));

        // notify_waiters only wakes tasks already waiting; retry until run() returns
        while !handle.is_finished() {
            broker.shutdown().await;
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert!(handle.await.unwrap().is_ok());
    }
}
