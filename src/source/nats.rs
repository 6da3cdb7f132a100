// Copyright (c) 2025 - Cowboy AI, Inc.
//! NATS discovery source
//!
//! Each message on the configured subject carries one JSON-encoded
//! [`DiscoveryBatch`]. Messages that fail to decode are logged and dropped;
//! they never stop the stream.

use async_nats::{Client, ConnectOptions, Message};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::{info, warn};

use super::DiscoverySource;
use crate::config::NatsSourceConfig;
use crate::discovery::DiscoveryBatch;
use crate::errors::ReconcileError;

/// Discovery batches received on a NATS subject
#[derive(Clone)]
pub struct NatsDiscoverySource {
    client: Client,
    subject: String,
}

impl NatsDiscoverySource {
    /// Connect using the given configuration
    pub async fn connect(config: &NatsSourceConfig) -> Result<Self, ReconcileError> {
        let connect_options = ConnectOptions::new()
            .name(&config.name)
            .connection_timeout(config.connect_timeout())
            .request_timeout(Some(config.request_timeout()));

        let client = async_nats::connect_with_options(config.servers.join(","), connect_options)
            .await
            .map_err(|e| ReconcileError::Source(format!("NATS connection failed: {}", e)))?;

        info!(servers = ?config.servers, "Connected to NATS");

        Ok(Self::from_client(client, config.subject.clone()))
    }

    /// Wrap an existing connection
    pub fn from_client(client: Client, subject: impl Into<String>) -> Self {
        Self {
            client,
            subject: subject.into(),
        }
    }
}

/// Decode one message, logging and dropping it on failure
pub fn decode_message(message: &Message) -> Option<DiscoveryBatch> {
    match DiscoveryBatch::from_json(&message.payload) {
        Ok(batch) => Some(batch),
        Err(error) => {
            warn!(
                subject = %message.subject,
                bytes = message.payload.len(),
                error = %error,
                "Dropping undecodable discovery message"
            );
            None
        }
    }
}

#[async_trait]
impl DiscoverySource for NatsDiscoverySource {
    async fn subscribe(&self) -> Result<BoxStream<'static, DiscoveryBatch>, ReconcileError> {
        let subscriber = self.client.subscribe(self.subject.clone()).await?;
        info!(subject = %self.subject, "Subscribed to discovery subject");

        Ok(subscriber
            .filter_map(|message| async move { decode_message(&message) })
            .boxed())
    }

    fn name(&self) -> &str {
        "nats"
    }
}
