// Copyright (c) 2025 - Cowboy AI, Inc.
//! NetBox Domain Model
//!
//! Value objects for the entities the reconciler pushes, with the invariants
//! NetBox enforces on them.
//!
//! # Value Objects with Invariants
//!
//! - [`Slug`] - NetBox slug derived from a display name
//! - [`CidrAddress`] - IPv4/IPv6 address with mandatory prefix length
//! - [`MacAddress`] - 48-bit MAC address, canonical upper-case form
//! - [`InterfaceSpeed`] - kbps in `[0, 2147483647]`
//! - [`Mtu`] - at least 1
//!
//! # Vocabularies
//!
//! - [`vocabulary::STATUS_VOCABULARY`] - agent status → NetBox status
//! - [`vocabulary::LINK_STATE_VOCABULARY`] - agent link state → `enabled`

pub mod entities;
pub mod network;
pub mod slug;
pub mod vocabulary;

pub use entities::{
    AssignedObject, Device, DeviceType, EntityKey, EntityKind, Interface, IpAddress, NamedObject,
    NormalizedEntity, RemoteId, Site,
};
pub use network::{CidrAddress, InterfaceSpeed, MacAddress, Mtu, NetworkError};
pub use slug::{Slug, SlugError};
pub use vocabulary::{Bounds, Status};
