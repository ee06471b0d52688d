// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! fedrti broker
//!
//! Standalone broker for a federation runtime. Federates connect to its
//! command port to create, join and coordinate federation executions.
//!
//! # Usage
//!
//! ```bash
//! # Start on the default port (60400)
//! fedrti-broker
//!
//! # Descriptor search path and best-effort reflections over UDP
//! fedrti-broker --descriptor-path /opt/federations --udp-port 60401
//!
//! # Everything from a config file, audit trail to disk
//! fedrti-broker --config broker.json --audit-file audit.jsonl
//! ```

use clap::Parser;
use fedrti_broker::{Broker, BrokerConfig};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// fedrti broker - central coordinator for federation executions
#[derive(Parser, Debug)]
#[command(name = "fedrti-broker")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TCP command port
    #[arg(short, long, default_value = "60400")]
    port: u16,

    /// Bind address (0.0.0.0 for all interfaces)
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// UDP port for best-effort reflections
    #[arg(long)]
    udp_port: Option<u16>,

    /// Configuration file (JSON format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory searched for federation descriptors (repeatable)
    #[arg(short = 'd', long = "descriptor-path")]
    descriptor_paths: Vec<PathBuf>,

    /// Append audit records (JSON lines) to this file
    #[arg(long)]
    audit_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = if let Some(config_path) = args.config {
        info!("Loading config from {:?}", config_path);
        BrokerConfig::from_file(&config_path)?
    } else {
        BrokerConfig {
            bind_address: args.bind.parse()?,
            port: args.port,
            udp_port: args.udp_port,
            descriptor_paths: args.descriptor_paths,
            audit_file: args.audit_file,
            ..Default::default()
        }
    };

    let broker = Broker::bind(config.clone()).await?;

    info!("+----------------------------------------------------+");
    info!(
        "|       fedrti broker v{}                        |",
        env!("CARGO_PKG_VERSION")
    );
    info!("+----------------------------------------------------+");
    info!("|  Bind:   {:40} |", broker.local_addr());
    info!(
        "|  UDP:    {:40} |",
        broker
            .udp_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "disabled".to_string())
    );
    info!(
        "|  FED:    {:40} |",
        format!("{} search path(s)", config.descriptor_paths.len())
    );
    info!(
        "|  Audit:  {:40} |",
        config
            .audit_file
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "log".to_string())
    );
    info!("+----------------------------------------------------+");

    let broker_handle = broker.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received, stopping broker...");
        broker_handle.shutdown().await;
    });

    broker.run().await?;

    info!("Broker stopped");
    Ok(())
}
