// Copyright (c) 2025 - Cowboy AI, Inc.
//! Discovery Facts
//!
//! Raw observations delivered by the discovery agent pipeline. Facts are
//! untrusted: every field is validated by the normalizer before anything is
//! pushed.
//!
//! # Wire Shape
//!
//! One JSON document per batch:
//!
//! ```json
//! {
//!   "batch_id": "01934f4a-0001-7000-8000-000000000001",
//!   "agent": "agent-east",
//!   "facts": [
//!     { "kind": "site", "name": "DC East", "status": "alive" },
//!     { "kind": "interface", "device": "edge-01", "name": "Gi0/1", "state": "up" }
//!   ]
//! }
//! ```
//!
//! Facts decode one at a time. A fact of a known kind whose fields do not
//! decode is kept as [`DiscoveryFact::Malformed`] and reported as a rejection
//! under its best-effort key. A fact without a known `kind` is dropped with a
//! warning. Neither fails the rest of the batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::domain::{CidrAddress, EntityKey, EntityKind, Slug};
use crate::errors::ReconcileError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteFact {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTypeFact {
    pub manufacturer: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFact {
    pub name: String,
    /// Site name
    pub site: String,
    /// Device type model
    pub device_type: String,
    /// Device role name
    pub role: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceFact {
    /// Owning device name
    pub device: String,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub interface_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    /// Link state, `up` or `down`
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddressFact {
    /// CIDR notation
    pub address: String,
    /// Device owning the interface
    pub device: String,
    /// Interface the address is bound to
    pub interface: String,
}

/// A single observation from the discovery agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscoveryFact {
    Site(SiteFact),
    DeviceType(DeviceTypeFact),
    Device(DeviceFact),
    Interface(InterfaceFact),
    IpAddress(IpAddressFact),
    /// Produced by batch decoding only, never on the wire
    #[serde(skip)]
    Malformed(MalformedFact),
}

/// A fact of a known kind whose fields could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedFact {
    pub kind: EntityKind,
    /// Key recovered from whatever fields were readable
    pub key: String,
    pub error: ReconcileError,
}

impl DiscoveryFact {
    pub fn kind(&self) -> EntityKind {
        match self {
            DiscoveryFact::Site(_) => EntityKind::Site,
            DiscoveryFact::DeviceType(_) => EntityKind::DeviceType,
            DiscoveryFact::Device(_) => EntityKind::Device,
            DiscoveryFact::Interface(_) => EntityKind::Interface,
            DiscoveryFact::IpAddress(_) => EntityKind::IpAddress,
            DiscoveryFact::Malformed(fact) => fact.kind,
        }
    }

    /// Key the fact would normalize to
    ///
    /// Falls back to the raw name when the name cannot be slugged, so that a
    /// rejected fact can still be reported and its dependents skipped.
    pub fn natural_key(&self) -> EntityKey {
        let key = match self {
            DiscoveryFact::Site(fact) => slug_or_raw(&fact.name),
            DiscoveryFact::DeviceType(fact) => slug_or_raw(&fact.model),
            DiscoveryFact::Device(fact) => slug_or_raw(&fact.name),
            DiscoveryFact::Interface(fact) => interface_key(&fact.device, &fact.name),
            DiscoveryFact::IpAddress(fact) => cidr_or_raw(&fact.address),
            DiscoveryFact::Malformed(fact) => fact.key.clone(),
        };
        EntityKey::new(self.kind(), key)
    }
}

fn slug_or_raw(name: &str) -> String {
    Slug::from_name(name)
        .map(|slug| slug.to_string())
        .unwrap_or_else(|_| name.to_string())
}

fn interface_key(device: &str, name: &str) -> String {
    format!("{}/{}", slug_or_raw(device), name.trim())
}

fn cidr_or_raw(address: &str) -> String {
    CidrAddress::new(address)
        .map(|cidr| cidr.to_string())
        .unwrap_or_else(|_| address.to_string())
}

/// Decode one wire fact
///
/// Returns `None` for a fact without a known `kind` tag.
fn decode_fact(raw: Value) -> Option<DiscoveryFact> {
    let tag = raw.get("kind").and_then(Value::as_str);
    let Some(kind) = tag.and_then(|tag| EntityKind::ALL.into_iter().find(|kind| kind.as_str() == tag))
    else {
        warn!(kind = tag.unwrap_or("-"), "Dropping discovery fact of unknown kind");
        return None;
    };

    match DiscoveryFact::deserialize(&raw) {
        Ok(fact) => Some(fact),
        Err(error) => Some(DiscoveryFact::Malformed(MalformedFact {
            kind,
            key: raw_key(kind, &raw),
            error: decode_error(&raw, error),
        })),
    }
}

/// Natural key read straight from the JSON fields that are strings
fn raw_key(kind: EntityKind, raw: &Value) -> String {
    let field = |name: &str| raw.get(name).and_then(Value::as_str).unwrap_or_default();
    match kind {
        EntityKind::Site | EntityKind::Device => slug_or_raw(field("name")),
        EntityKind::DeviceType => slug_or_raw(field("model")),
        EntityKind::Interface => interface_key(field("device"), field("name")),
        EntityKind::IpAddress => cidr_or_raw(field("address")),
    }
}

fn decode_error(raw: &Value, error: serde_json::Error) -> ReconcileError {
    for field in ["speed", "mtu"] {
        if let Some(Value::Number(number)) = raw.get(field) {
            if number.as_i64().is_none() {
                return ReconcileError::invalid_field(
                    field,
                    number.to_string(),
                    "not representable as a 64-bit integer",
                );
            }
        }
    }
    ReconcileError::invalid_field("fact", raw.to_string(), error)
}

fn deserialize_facts<'de, D>(deserializer: D) -> Result<Vec<DiscoveryFact>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw.into_iter().filter_map(decode_fact).collect())
}

/// A batch of facts delivered together by the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryBatch {
    #[serde(default = "Uuid::now_v7")]
    pub batch_id: Uuid,

    #[serde(default = "Utc::now")]
    pub observed_at: DateTime<Utc>,

    /// Reporting agent, if the producer identifies itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,

    #[serde(default, deserialize_with = "deserialize_facts")]
    pub facts: Vec<DiscoveryFact>,
}

impl DiscoveryBatch {
    pub fn new(facts: Vec<DiscoveryFact>) -> Self {
        Self {
            batch_id: Uuid::now_v7(),
            observed_at: Utc::now(),
            agent: None,
            facts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Decode a batch from its JSON wire form
    pub fn from_json(payload: &[u8]) -> Result<Self, ReconcileError> {
        Ok(serde_json::from_slice(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_batch() {
        let payload = br#"{
            "batch_id": "01934f4a-0001-7000-8000-000000000001",
            "observed_at": "2026-01-19T12:00:00Z",
            "agent": "agent-east",
            "facts": [
                { "kind": "site", "name": "DC East", "status": "alive" },
                { "kind": "device_type", "manufacturer": "Cisco", "model": "Catalyst 3850" },
                { "kind": "device", "name": "edge-01", "site": "DC East",
                  "device_type": "Catalyst 3850", "role": "Access", "status": "alive" },
                { "kind": "interface", "device": "edge-01", "name": "Gi0/1",
                  "type": "1000base-t", "speed": 1000000, "mtu": 1500, "state": "up" },
                { "kind": "ip_address", "address": "10.0.0.1/24",
                  "device": "edge-01", "interface": "Gi0/1" }
            ]
        }"#;

        let batch = DiscoveryBatch::from_json(payload).unwrap();
        assert_eq!(batch.len(), 5);
        assert_eq!(batch.agent.as_deref(), Some("agent-east"));
        assert_eq!(
            batch.facts[3],
            DiscoveryFact::Interface(InterfaceFact {
                device: "edge-01".to_string(),
                name: "Gi0/1".to_string(),
                interface_type: Some("1000base-t".to_string()),
                speed: Some(1_000_000),
                mtu: Some(1500),
                mac_address: None,
                state: "up".to_string(),
            })
        );
    }

    #[test]
    fn test_decode_defaults() {
        let batch = DiscoveryBatch::from_json(br#"{}"#).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.batch_id.get_version_num(), 7);
    }

    #[test]
    fn test_decode_unknown_kind_is_dropped() {
        let batch = DiscoveryBatch::from_json(
            br#"{"facts":[{"kind":"cable"},{"name":"untagged"},{"kind":"site","name":"DC1","status":"alive"}]}"#,
        )
        .unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.facts[0].kind(), EntityKind::Site);
    }

    #[test]
    fn test_decode_rejects_malformed_document() {
        let result = DiscoveryBatch::from_json(br#"{"facts":{"kind":"site"}}"#);
        assert!(matches!(result, Err(ReconcileError::Serialization(_))));
    }

    #[test]
    fn test_bad_fact_does_not_sink_batch() {
        let payload = br#"{
            "facts": [
                { "kind": "site", "name": "DC East", "status": "alive" },
                { "kind": "interface", "device": "edge-01", "name": "Gi0/1",
                  "speed": 99999999999999999999, "state": "up" },
                { "kind": "device", "name": "edge-02", "site": 7 }
            ]
        }"#;

        let batch = DiscoveryBatch::from_json(payload).unwrap();
        assert_eq!(batch.len(), 3);

        assert_eq!(
            batch.facts[1].natural_key().to_string(),
            "interface:edge-01/Gi0/1"
        );
        match &batch.facts[1] {
            DiscoveryFact::Malformed(fact) => assert!(matches!(
                fact.error,
                ReconcileError::InvalidField { field: "speed", .. }
            )),
            other => panic!("expected malformed fact, got {:?}", other),
        }

        assert_eq!(batch.facts[2].natural_key().to_string(), "device:edge-02");
        match &batch.facts[2] {
            DiscoveryFact::Malformed(fact) => assert!(matches!(
                fact.error,
                ReconcileError::InvalidField { field: "fact", .. }
            )),
            other => panic!("expected malformed fact, got {:?}", other),
        }
    }

    #[test]
    fn test_natural_keys() {
        let interface = DiscoveryFact::Interface(InterfaceFact {
            device: "Edge 01".to_string(),
            name: "eth0".to_string(),
            interface_type: None,
            speed: None,
            mtu: None,
            mac_address: None,
            state: "up".to_string(),
        });
        assert_eq!(interface.natural_key().to_string(), "interface:edge-01/eth0");

        let site = DiscoveryFact::Site(SiteFact {
            name: "???".to_string(),
            status: "alive".to_string(),
        });
        assert_eq!(site.natural_key().key, "???");
    }
}
