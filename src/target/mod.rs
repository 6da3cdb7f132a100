// Copyright (c) 2025 - Cowboy AI, Inc.
//! Target System Capability
//!
//! The reconciler pushes entities through the [`TargetClient`] trait and
//! never talks HTTP directly. Implementations:
//!
//! - [`NetBoxClient`] - NetBox REST API (`netbox` feature)
//! - [`InMemoryTarget`] - in-process object store for dry runs and tests
//!
//! The capability is intentionally small: look up by natural-key filters,
//! create, update. It is not transactional across kinds.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{EntityKind, RemoteId};

pub mod memory;
#[cfg(feature = "netbox")]
pub mod netbox;

pub use memory::InMemoryTarget;
#[cfg(feature = "netbox")]
pub use netbox::NetBoxClient;

/// Lookup filters as `(query field, value)` pairs
pub type Filters = [(&'static str, String)];

/// Errors returned by a target client
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Connection, timeout or other transport failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Target answered with a non-success status
    #[error("Target returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Natural-key lookup matched more than one object
    #[error("Lookup for {kind} matched {count} objects")]
    Ambiguous { kind: EntityKind, count: u64 },

    /// Client could not be constructed
    #[error("Client configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Transport failures and 5xx answers may succeed on a second attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Status { status, .. } => *status >= 500,
            ClientError::Decode(_)
            | ClientError::Ambiguous { .. }
            | ClientError::Configuration(_) => false,
        }
    }
}

/// Push capability over the target inventory
#[async_trait]
pub trait TargetClient: Send + Sync {
    /// Find the object of `kind` matching every filter
    async fn find_by_key(
        &self,
        kind: EntityKind,
        filters: &Filters,
    ) -> Result<Option<RemoteId>, ClientError>;

    /// Create an object and return its identifier
    async fn create(&self, kind: EntityKind, payload: &Value) -> Result<RemoteId, ClientError>;

    /// Update the mutable fields of an existing object
    async fn update(
        &self,
        kind: EntityKind,
        id: RemoteId,
        payload: &Value,
    ) -> Result<(), ClientError>;

    /// Verify the target is reachable
    async fn health_check(&self) -> Result<(), ClientError>;

    /// Client name for logs
    fn name(&self) -> &str;
}
