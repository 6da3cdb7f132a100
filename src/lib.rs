//! Reconciles network discovery facts into a NetBox inventory
//!
//! Discovery batches arrive from a [`source::DiscoverySource`], are validated by
//! the [`normalize`] functions, ordered into dependency stages by
//! [`plan::resolve`], and pushed through a [`target::TargetClient`] by the
//! [`reconcile::Reconciler`]. The [`service::ReconcileService`] drives that
//! loop under a cancellable lifecycle.

pub mod cache;
pub mod config;
pub mod discovery;
pub mod domain;
pub mod errors;
pub mod normalize;
pub mod payload;
pub mod plan;
pub mod reconcile;
pub mod report;
pub mod service;
pub mod source;
pub mod state_machine;
pub mod target;

// Re-export commonly used types
pub use cache::ResolutionCache;
pub use config::{NatsSourceConfig, NetBoxConfig, ReconcileConfig, ServiceConfig};
pub use discovery::{DiscoveryBatch, DiscoveryFact};
pub use errors::{ReconcileError, ReconcileResult};
pub use reconcile::{Reconciler, UpsertAction, Upserted};
pub use report::{BatchReport, EntityOutcome, Outcome, SkipReason};
pub use service::ReconcileService;
pub use source::{ChannelSource, DiscoverySource, NatsDiscoverySource};
pub use state_machine::DriverState;
pub use target::{ClientError, InMemoryTarget, TargetClient};
#[cfg(feature = "netbox")]
pub use target::NetBoxClient;
