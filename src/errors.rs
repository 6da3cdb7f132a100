// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for reconciliation operations

use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::network::NetworkError;
use crate::domain::vocabulary::Bounds;
use crate::domain::EntityKey;
use crate::state_machine::TransitionError;
use crate::target::ClientError;

/// Errors that can occur while normalizing, planning or pushing discovery facts
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Source status is not part of the status vocabulary
    #[error("Unknown status: {0:?}")]
    UnknownStatus(String),

    /// Source link state is not part of the link-state vocabulary
    #[error("Unknown link state: {0:?}")]
    UnknownState(String),

    /// Numeric field outside the bounds the target accepts
    #[error("{field} out of range: {value} not in {bounds}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        bounds: Bounds,
    },

    /// Field failed format validation (slug, MAC, CIDR, empty name)
    #[error("Invalid {field} {value:?}: {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// Referenced entity is neither cached nor planned in the batch
    #[error("Unresolved reference to {0}")]
    UnresolvedReference(EntityKey),

    /// Target system call failed
    #[error("Remote call failed: {0}")]
    RemoteCall(#[from] ClientError),

    /// Target system could not be reached at startup
    #[error("Target unavailable: {0}")]
    TargetUnavailable(ClientError),

    /// Discovery source could not be subscribed
    #[error("Discovery source error: {0}")]
    Source(String),

    /// Payload or message (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Driver lifecycle transition rejected
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] TransitionError),

    /// Reconcile loop terminated abnormally
    #[error("Reconcile loop aborted: {0}")]
    LoopAborted(String),
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;

impl ReconcileError {
    pub(crate) fn invalid_field(
        field: &'static str,
        value: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        ReconcileError::InvalidField {
            field,
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<NetworkError> for ReconcileError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::OutOfRange {
                field,
                value,
                bounds,
            } => ReconcileError::OutOfRange {
                field,
                value,
                bounds,
            },
            NetworkError::InvalidMacAddress(value) => {
                ReconcileError::invalid_field("mac_address", value, "expected 6 hex octets")
            }
            NetworkError::InvalidIpAddress(value) => {
                ReconcileError::invalid_field("address", value, "not an IP address")
            }
            NetworkError::InvalidCidr(value) => {
                ReconcileError::invalid_field("address", value, "expected CIDR notation")
            }
            NetworkError::InvalidPrefixLength { address, prefix } => ReconcileError::invalid_field(
                "address",
                address,
                format!("prefix length {} too long for address family", prefix),
            ),
        }
    }
}

impl From<serde_json::Error> for ReconcileError {
    fn from(err: serde_json::Error) -> Self {
        ReconcileError::Serialization(err.to_string())
    }
}

impl From<async_nats::SubscribeError> for ReconcileError {
    fn from(err: async_nats::SubscribeError) -> Self {
        ReconcileError::Source(err.to_string())
    }
}
