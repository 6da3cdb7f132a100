// Copyright (c) 2025 - Cowboy AI, Inc.
//! Normalizer - Pure Fact → Entity Translation
//!
//! Every function here is pure: no I/O, no logging, deterministic. Errors are
//! returned to the caller, which records them against the offending fact.
//!
//! The normalizer fails closed:
//! - status and link state outside their vocabularies are errors
//! - out-of-range speed/MTU are errors (never clamped)
//! - unparseable MAC/CIDR and names without slug-able characters are errors

use crate::discovery::{
    DeviceFact, DeviceTypeFact, DiscoveryFact, InterfaceFact, IpAddressFact, SiteFact,
};
use crate::domain::vocabulary::{map_link_state, map_status};
use crate::domain::{
    AssignedObject, CidrAddress, Device, DeviceType, EntityKey, Interface,
    InterfaceSpeed, IpAddress, MacAddress, Mtu, NamedObject, NormalizedEntity, Site, Slug,
};
use crate::errors::ReconcileError;

/// Interface type sent when the agent does not report one
pub const DEFAULT_INTERFACE_TYPE: &str = "other";

/// A fact that failed normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub key: EntityKey,
    pub error: ReconcileError,
}

/// Translate one discovery fact into a validated entity
pub fn normalize(fact: &DiscoveryFact) -> Result<NormalizedEntity, ReconcileError> {
    match fact {
        DiscoveryFact::Site(fact) => normalize_site(fact).map(NormalizedEntity::Site),
        DiscoveryFact::DeviceType(fact) => {
            normalize_device_type(fact).map(NormalizedEntity::DeviceType)
        }
        DiscoveryFact::Device(fact) => normalize_device(fact).map(NormalizedEntity::Device),
        DiscoveryFact::Interface(fact) => {
            normalize_interface(fact).map(NormalizedEntity::Interface)
        }
        DiscoveryFact::IpAddress(fact) => {
            normalize_ip_address(fact).map(NormalizedEntity::IpAddress)
        }
        DiscoveryFact::Malformed(fact) => Err(fact.error.clone()),
    }
}

/// Normalize a whole batch, keeping input order in both outputs
pub fn normalize_batch(facts: &[DiscoveryFact]) -> (Vec<NormalizedEntity>, Vec<Rejection>) {
    let mut entities = Vec::with_capacity(facts.len());
    let mut rejections = Vec::new();

    for fact in facts {
        match normalize(fact) {
            Ok(entity) => entities.push(entity),
            Err(error) => rejections.push(Rejection {
                key: fact.natural_key(),
                error,
            }),
        }
    }

    (entities, rejections)
}

pub fn normalize_site(fact: &SiteFact) -> Result<Site, ReconcileError> {
    let name = required("name", &fact.name)?;
    Ok(Site {
        slug: slug_for("name", &name)?,
        name,
        status: map_status(&fact.status)?,
    })
}

pub fn normalize_device_type(fact: &DeviceTypeFact) -> Result<DeviceType, ReconcileError> {
    let model = required("model", &fact.model)?;
    let manufacturer = required("manufacturer", &fact.manufacturer)?;
    Ok(DeviceType {
        manufacturer: named_object("manufacturer", manufacturer)?,
        slug: slug_for("model", &model)?,
        model,
    })
}

pub fn normalize_device(fact: &DeviceFact) -> Result<Device, ReconcileError> {
    let name = required("name", &fact.name)?;
    let role = required("role", &fact.role)?;
    Ok(Device {
        slug: slug_for("name", &name)?,
        site: slug_for("site", &fact.site)?,
        device_type: slug_for("device_type", &fact.device_type)?,
        role: named_object("role", role)?,
        status: map_status(&fact.status)?,
        serial: fact
            .serial
            .as_deref()
            .map(str::trim)
            .filter(|serial| !serial.is_empty())
            .map(str::to_string),
        name,
    })
}

pub fn normalize_interface(fact: &InterfaceFact) -> Result<Interface, ReconcileError> {
    let name = required("name", &fact.name)?;
    let interface_type = fact
        .interface_type
        .as_deref()
        .map(str::trim)
        .filter(|kind| !kind.is_empty())
        .unwrap_or(DEFAULT_INTERFACE_TYPE)
        .to_string();

    Ok(Interface {
        device: slug_for("device", &fact.device)?,
        name,
        interface_type,
        speed: fact.speed.map(InterfaceSpeed::new).transpose()?,
        mtu: fact.mtu.map(Mtu::new).transpose()?,
        mac_address: fact
            .mac_address
            .as_deref()
            .filter(|mac| !mac.trim().is_empty())
            .map(MacAddress::new)
            .transpose()?,
        enabled: map_link_state(&fact.state)?,
    })
}

pub fn normalize_ip_address(fact: &IpAddressFact) -> Result<IpAddress, ReconcileError> {
    let interface = required("interface", &fact.interface)?;
    Ok(IpAddress {
        address: CidrAddress::new(&fact.address)?,
        assigned_object: AssignedObject::Interface {
            device: slug_for("device", &fact.device)?,
            name: interface,
        },
    })
}

fn required(field: &'static str, value: &str) -> Result<String, ReconcileError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ReconcileError::invalid_field(field, value, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn slug_for(field: &'static str, name: &str) -> Result<Slug, ReconcileError> {
    Slug::from_name(name).map_err(|e| ReconcileError::invalid_field(field, name, e))
}

fn named_object(field: &'static str, name: String) -> Result<NamedObject, ReconcileError> {
    let slug = slug_for(field, &name)?;
    Ok(NamedObject { name, slug })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityKind;
    use crate::domain::vocabulary::{Status, INTERFACE_SPEED_MAX, SPEED_BOUNDS};
    use pretty_assertions::assert_eq;

    fn interface_fact(speed: Option<i64>, mtu: Option<i64>, state: &str) -> InterfaceFact {
        InterfaceFact {
            device: "edge-01".to_string(),
            name: "Gi0/1".to_string(),
            interface_type: None,
            speed,
            mtu,
            mac_address: Some("00:11:22:aa:bb:cc".to_string()),
            state: state.to_string(),
        }
    }

    #[test]
    fn test_normalize_site() {
        let site = normalize_site(&SiteFact {
            name: " DC East ".to_string(),
            status: "dead".to_string(),
        })
        .unwrap();

        assert_eq!(site.name, "DC East");
        assert_eq!(site.slug.as_str(), "dc-east");
        assert_eq!(site.status, Status::Offline);
    }

    #[test]
    fn test_normalize_site_unknown_status() {
        let result = normalize_site(&SiteFact {
            name: "DC East".to_string(),
            status: "unknown".to_string(),
        });
        assert_eq!(result, Err(ReconcileError::UnknownStatus("unknown".to_string())));
    }

    #[test]
    fn test_device_type_slug_from_model() {
        let device_type = normalize_device_type(&DeviceTypeFact {
            manufacturer: "Palo Alto".to_string(),
            model: "PA-5250".to_string(),
        })
        .unwrap();

        assert_eq!(device_type.slug.as_str(), "pa-5250");
        assert_eq!(device_type.manufacturer.slug.as_str(), "palo-alto");
    }

    #[test]
    fn test_normalize_device() {
        let device = normalize_device(&DeviceFact {
            name: "edge-01".to_string(),
            site: "DC East".to_string(),
            device_type: "Catalyst 3850".to_string(),
            role: "Access Switch".to_string(),
            status: "alive".to_string(),
            serial: Some("  ".to_string()),
        })
        .unwrap();

        assert_eq!(device.site.as_str(), "dc-east");
        assert_eq!(device.device_type.as_str(), "catalyst-3850");
        assert_eq!(device.role.slug.as_str(), "access-switch");
        assert_eq!(device.status, Status::Active);
        assert_eq!(device.serial, None);
    }

    #[test]
    fn test_normalize_interface() {
        let interface = normalize_interface(&interface_fact(Some(1_000_000), Some(9000), "down"))
            .unwrap();

        assert_eq!(interface.interface_type, DEFAULT_INTERFACE_TYPE);
        assert_eq!(interface.speed.map(|s| s.value()), Some(1_000_000));
        assert_eq!(interface.mtu.map(|m| m.value()), Some(9000));
        assert_eq!(
            interface.mac_address.map(|m| m.to_string()).as_deref(),
            Some("00:11:22:AA:BB:CC")
        );
        assert!(!interface.enabled);
    }

    #[test]
    fn test_interface_out_of_range() {
        let speed = normalize_interface(&interface_fact(Some(INTERFACE_SPEED_MAX + 1), None, "up"));
        assert_eq!(
            speed,
            Err(ReconcileError::OutOfRange {
                field: "speed",
                value: INTERFACE_SPEED_MAX + 1,
                bounds: SPEED_BOUNDS,
            })
        );

        let mtu = normalize_interface(&interface_fact(None, Some(0), "up"));
        assert!(matches!(
            mtu,
            Err(ReconcileError::OutOfRange { field: "mtu", value: 0, .. })
        ));
    }

    #[test]
    fn test_interface_unknown_state() {
        let result = normalize_interface(&interface_fact(None, None, "testing"));
        assert_eq!(result, Err(ReconcileError::UnknownState("testing".to_string())));
    }

    #[test]
    fn test_ip_address_requires_prefix() {
        let result = normalize_ip_address(&IpAddressFact {
            address: "10.0.0.1".to_string(),
            device: "edge-01".to_string(),
            interface: "Gi0/1".to_string(),
        });
        assert!(matches!(
            result,
            Err(ReconcileError::InvalidField { field: "address", .. })
        ));
    }

    #[test]
    fn test_normalize_batch_keeps_order() {
        let facts = vec![
            DiscoveryFact::Site(SiteFact {
                name: "A".to_string(),
                status: "alive".to_string(),
            }),
            DiscoveryFact::Site(SiteFact {
                name: "B".to_string(),
                status: "zombie".to_string(),
            }),
            DiscoveryFact::Site(SiteFact {
                name: "C".to_string(),
                status: "dead".to_string(),
            }),
        ];

        let (entities, rejections) = normalize_batch(&facts);

        let keys: Vec<_> = entities.iter().map(|e| e.key().key).collect();
        assert_eq!(keys, vec!["a", "c"]);
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].key, EntityKey::new(EntityKind::Site, "b"));
        assert_eq!(
            rejections[0].error,
            ReconcileError::UnknownStatus("zombie".to_string())
        );
    }
}
