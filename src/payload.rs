// Copyright (c) 2025 - Cowboy AI, Inc.
//! Wire Payloads
//!
//! Builds the NetBox request body and natural-key lookup filters for a
//! normalized entity. References to other entities are replaced here by the
//! remote ids held in the resolution cache; a missing id is an
//! `UnresolvedReference`, never a placeholder.

use serde::Serialize;
use serde_json::Value;

use crate::cache::ResolutionCache;
use crate::domain::{
    Device, DeviceType, EntityKey, Interface, InterfaceSpeed, IpAddress, MacAddress, Mtu,
    NamedObject, NormalizedEntity, Site, Slug, Status,
};
use crate::errors::ReconcileError;

/// Lookup filters plus request body for one upsert
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertRequest {
    pub filters: Vec<(&'static str, String)>,
    pub body: Value,
}

#[derive(Debug, Serialize)]
struct SitePayload<'a> {
    name: &'a str,
    slug: &'a Slug,
    status: Status,
}

#[derive(Debug, Serialize)]
struct DeviceTypePayload<'a> {
    manufacturer: &'a NamedObject,
    model: &'a str,
    slug: &'a Slug,
}

#[derive(Debug, Serialize)]
struct DevicePayload<'a> {
    name: &'a str,
    site: u64,
    device_type: u64,
    role: &'a NamedObject,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    serial: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct InterfacePayload<'a> {
    device: u64,
    name: &'a str,
    #[serde(rename = "type")]
    interface_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<InterfaceSpeed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mtu: Option<Mtu>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mac_address: Option<MacAddress>,
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct IpAddressPayload<'a> {
    address: String,
    assigned_object_type: &'a str,
    assigned_object_id: u64,
}

impl UpsertRequest {
    /// Build the request for `entity`, resolving references through `cache`
    pub fn build(
        entity: &NormalizedEntity,
        cache: &ResolutionCache,
    ) -> Result<Self, ReconcileError> {
        match entity {
            NormalizedEntity::Site(site) => Self::site(site),
            NormalizedEntity::DeviceType(device_type) => Self::device_type(device_type),
            NormalizedEntity::Device(device) => Self::device(device, cache),
            NormalizedEntity::Interface(interface) => Self::interface(interface, cache),
            NormalizedEntity::IpAddress(ip) => Self::ip_address(ip, cache),
        }
    }

    fn site(site: &Site) -> Result<Self, ReconcileError> {
        Ok(Self {
            filters: vec![("slug", site.slug.to_string())],
            body: serde_json::to_value(SitePayload {
                name: &site.name,
                slug: &site.slug,
                status: site.status,
            })?,
        })
    }

    fn device_type(device_type: &DeviceType) -> Result<Self, ReconcileError> {
        Ok(Self {
            filters: vec![("slug", device_type.slug.to_string())],
            body: serde_json::to_value(DeviceTypePayload {
                manufacturer: &device_type.manufacturer,
                model: &device_type.model,
                slug: &device_type.slug,
            })?,
        })
    }

    fn device(device: &Device, cache: &ResolutionCache) -> Result<Self, ReconcileError> {
        let site = cache.require(&EntityKey::site(&device.site))?;
        let device_type = cache.require(&EntityKey::device_type(&device.device_type))?;

        Ok(Self {
            filters: vec![("name", device.name.clone()), ("site_id", site.to_string())],
            body: serde_json::to_value(DevicePayload {
                name: &device.name,
                site: site.0,
                device_type: device_type.0,
                role: &device.role,
                status: device.status,
                serial: device.serial.as_deref(),
            })?,
        })
    }

    fn interface(interface: &Interface, cache: &ResolutionCache) -> Result<Self, ReconcileError> {
        let device = cache.require(&EntityKey::device(&interface.device))?;

        Ok(Self {
            filters: vec![
                ("device_id", device.to_string()),
                ("name", interface.name.clone()),
            ],
            body: serde_json::to_value(InterfacePayload {
                device: device.0,
                name: &interface.name,
                interface_type: &interface.interface_type,
                speed: interface.speed,
                mtu: interface.mtu,
                mac_address: interface.mac_address,
                enabled: interface.enabled,
            })?,
        })
    }

    fn ip_address(ip: &IpAddress, cache: &ResolutionCache) -> Result<Self, ReconcileError> {
        let assigned = cache.require(&ip.assigned_object.key())?;
        let address = ip.address.to_string();

        Ok(Self {
            filters: vec![("address", address.clone())],
            body: serde_json::to_value(IpAddressPayload {
                address,
                assigned_object_type: ip.assigned_object.object_type(),
                assigned_object_id: assigned.0,
            })?,
        })
    }
}
