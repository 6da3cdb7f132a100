// Copyright (c) 2025 - Cowboy AI, Inc.
//! NetBox Reconciler Service
//!
//! Subscribes to discovery batches on NATS and reconciles them into NetBox.
//!
//! - Discovery agent → NATS subject → normalize → plan → NetBox REST API
//!
//! Run with: cargo run --bin netbox-reconciler
//!
//! Configuration is read from `DIODE_SERVICE_*` environment variables; see
//! `cim_netbox_reconciler::config` for the full list. `RUST_LOG` overrides
//! `DIODE_SERVICE_LOG_LEVEL`.

use anyhow::{Context, Result};
use cim_netbox_reconciler::{
    config::{ServiceConfig, DEFAULT_ENV_PREFIX},
    NatsDiscoverySource, NetBoxClient, ReconcileService,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &ServiceConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(false)
        .init();
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("Failed to listen for ctrl-c")?,
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for ctrl-c")?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::from_env(DEFAULT_ENV_PREFIX)
        .context("Invalid service configuration")?;
    init_tracing(&config);

    info!(
        netbox = %config.netbox.endpoint,
        nats = ?config.nats.servers,
        subject = %config.nats.subject,
        concurrency = config.reconcile.concurrency,
        remote_retries = config.reconcile.remote_retries,
        "Starting NetBox reconciler"
    );

    let target = Arc::new(
        NetBoxClient::new(&config.netbox).context("Failed to create NetBox client")?,
    );
    let source = Arc::new(
        NatsDiscoverySource::connect(&config.nats)
            .await
            .context("Failed to connect to NATS")?,
    );

    let shutdown = CancellationToken::new();
    let mut service = ReconcileService::new(&config.reconcile, target, source, shutdown.clone());

    service
        .start()
        .await
        .context("Failed to start reconcile service")?;

    shutdown_signal().await?;
    info!("Shutdown signal received");

    shutdown.cancel();
    service
        .stop()
        .await
        .context("Failed to stop reconcile service")?;

    info!("NetBox reconciler stopped");
    Ok(())
}
