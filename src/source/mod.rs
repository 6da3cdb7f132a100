// Copyright (c) 2025 - Cowboy AI, Inc.
//! Discovery Sources
//!
//! A [`DiscoverySource`] hands the driver a stream of [`DiscoveryBatch`]es.
//! The stream ends when the producer goes away; the driver treats that as the
//! end of the session.
//!
//! - [`NatsDiscoverySource`] - JSON batches published on a NATS subject
//! - [`ChannelSource`] - in-process channel, for embedding and tests

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::discovery::DiscoveryBatch;
use crate::errors::ReconcileError;

pub mod nats;

pub use nats::NatsDiscoverySource;

/// Producer of discovery batches
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    /// Open the batch stream
    async fn subscribe(&self) -> Result<BoxStream<'static, DiscoveryBatch>, ReconcileError>;

    /// Source name for logs
    fn name(&self) -> &str;
}

/// Source fed through an in-process channel
///
/// The receiving half can be subscribed once; a second `subscribe` fails.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: Mutex<Option<mpsc::Receiver<DiscoveryBatch>>>,
}

impl ChannelSource {
    /// Create a source and the sender that feeds it
    pub fn new(buffer: usize) -> (mpsc::Sender<DiscoveryBatch>, Self) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (
            sender,
            Self {
                receiver: Mutex::new(Some(receiver)),
            },
        )
    }
}

#[async_trait]
impl DiscoverySource for ChannelSource {
    async fn subscribe(&self) -> Result<BoxStream<'static, DiscoveryBatch>, ReconcileError> {
        let receiver = self
            .receiver
            .lock()
            .map_err(|_| ReconcileError::Source("channel source lock poisoned".to_string()))?
            .take()
            .ok_or_else(|| ReconcileError::Source("channel source already subscribed".to_string()))?;

        Ok(ReceiverStream::new(receiver).boxed())
    }

    fn name(&self) -> &str {
        "channel"
    }
}
