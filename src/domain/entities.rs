// Copyright (c) 2025 - Cowboy AI, Inc.
//! Normalized NetBox Entities
//!
//! Validated, transient value objects produced by the normalizer. Cross-entity
//! references are held as local natural keys; they are turned into remote
//! identifiers only at push time, from the resolution cache.
//!
//! # Dependency DAG
//!
//! ```text
//! Site ──────┐
//!            ├──> Device ──> Interface ──> IpAddress
//! DeviceType ┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::network::{CidrAddress, InterfaceSpeed, MacAddress, Mtu};
use super::slug::{Slug, SlugError};
use super::vocabulary::{Status, INTERFACE_OBJECT_TYPE};

/// Entity kinds in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Site,
    DeviceType,
    Device,
    Interface,
    IpAddress,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Site,
        EntityKind::DeviceType,
        EntityKind::Device,
        EntityKind::Interface,
        EntityKind::IpAddress,
    ];

    /// Number of sequential stages in a plan
    pub const STAGE_COUNT: usize = 4;

    /// Stage this kind is pushed in. Kinds sharing a stage are independent.
    pub fn stage(&self) -> usize {
        match self {
            EntityKind::Site | EntityKind::DeviceType => 0,
            EntityKind::Device => 1,
            EntityKind::Interface => 2,
            EntityKind::IpAddress => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Site => "site",
            EntityKind::DeviceType => "device_type",
            EntityKind::Device => "device",
            EntityKind::Interface => "interface",
            EntityKind::IpAddress => "ip_address",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local natural key of an entity within a reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub key: String,
}

impl EntityKey {
    pub fn new(kind: EntityKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }

    pub fn site(slug: &Slug) -> Self {
        Self::new(EntityKind::Site, slug.as_str())
    }

    pub fn device_type(slug: &Slug) -> Self {
        Self::new(EntityKind::DeviceType, slug.as_str())
    }

    pub fn device(slug: &Slug) -> Self {
        Self::new(EntityKind::Device, slug.as_str())
    }

    /// Interfaces are unique per device
    pub fn interface(device: &Slug, name: &str) -> Self {
        Self::new(EntityKind::Interface, format!("{}/{}", device, name))
    }

    pub fn ip_address(address: &CidrAddress) -> Self {
        Self::new(EntityKind::IpAddress, address.to_string())
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.key)
    }
}

/// Identifier assigned by the target system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(pub u64);

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Catalog object referenced by name and slug (manufacturer, device role)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedObject {
    pub name: String,
    pub slug: Slug,
}

impl NamedObject {
    pub fn from_name(name: impl Into<String>) -> Result<Self, SlugError> {
        let name = name.into();
        let slug = Slug::from_name(&name)?;
        Ok(Self { name, slug })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub name: String,
    pub slug: Slug,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceType {
    pub manufacturer: NamedObject,
    pub model: String,
    /// Derived from `model`
    pub slug: Slug,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    pub slug: Slug,
    pub site: Slug,
    pub device_type: Slug,
    pub role: NamedObject,
    pub status: Status,
    pub serial: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub device: Slug,
    pub name: String,
    pub interface_type: String,
    pub speed: Option<InterfaceSpeed>,
    pub mtu: Option<Mtu>,
    pub mac_address: Option<MacAddress>,
    pub enabled: bool,
}

/// Object an IP address is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignedObject {
    Interface { device: Slug, name: String },
}

impl AssignedObject {
    /// NetBox content-type discriminator
    pub fn object_type(&self) -> &'static str {
        match self {
            AssignedObject::Interface { .. } => INTERFACE_OBJECT_TYPE,
        }
    }

    pub fn key(&self) -> EntityKey {
        match self {
            AssignedObject::Interface { device, name } => EntityKey::interface(device, name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpAddress {
    pub address: CidrAddress,
    pub assigned_object: AssignedObject,
}

/// A validated entity ready for planning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedEntity {
    Site(Site),
    DeviceType(DeviceType),
    Device(Device),
    Interface(Interface),
    IpAddress(IpAddress),
}

impl NormalizedEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            NormalizedEntity::Site(_) => EntityKind::Site,
            NormalizedEntity::DeviceType(_) => EntityKind::DeviceType,
            NormalizedEntity::Device(_) => EntityKind::Device,
            NormalizedEntity::Interface(_) => EntityKind::Interface,
            NormalizedEntity::IpAddress(_) => EntityKind::IpAddress,
        }
    }

    pub fn key(&self) -> EntityKey {
        match self {
            NormalizedEntity::Site(site) => EntityKey::site(&site.slug),
            NormalizedEntity::DeviceType(device_type) => EntityKey::device_type(&device_type.slug),
            NormalizedEntity::Device(device) => EntityKey::device(&device.slug),
            NormalizedEntity::Interface(interface) => {
                EntityKey::interface(&interface.device, &interface.name)
            }
            NormalizedEntity::IpAddress(ip) => EntityKey::ip_address(&ip.address),
        }
    }

    /// Keys that must resolve to remote ids before this entity is pushed
    pub fn dependencies(&self) -> Vec<EntityKey> {
        match self {
            NormalizedEntity::Site(_) | NormalizedEntity::DeviceType(_) => Vec::new(),
            NormalizedEntity::Device(device) => vec![
                EntityKey::site(&device.site),
                EntityKey::device_type(&device.device_type),
            ],
            NormalizedEntity::Interface(interface) => vec![EntityKey::device(&interface.device)],
            NormalizedEntity::IpAddress(ip) => vec![ip.assigned_object.key()],
        }
    }
}
