// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-netbox-reconciler
//!
//! Provides deterministic discovery data and target doubles shared by the
//! integration tests.
//!
//! # Design Principles
//! - Batch ids and timestamps are fixed constants
//! - Fixtures are the only place that builds discovery facts
//! - Every fixture topology is internally consistent unless its name says otherwise

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Notify, Semaphore};
use uuid::Uuid;

use cim_netbox_reconciler::discovery::{
    DeviceFact, DeviceTypeFact, DiscoveryBatch, DiscoveryFact, InterfaceFact, IpAddressFact,
    SiteFact,
};
use cim_netbox_reconciler::domain::{EntityKind, RemoteId};
use cim_netbox_reconciler::target::{ClientError, Filters, InMemoryTarget, TargetClient};

// Fixed batch ids (UUID v7 format, but deterministic for testing)
pub const BATCH_ID_1: &str = "01934f4a-0001-7000-8000-000000000001";
pub const BATCH_ID_2: &str = "01934f4a-0002-7000-8000-000000000002";

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

pub const SITE: &str = "DC East";
pub const MODEL: &str = "Catalyst 3850";

/// Parse a fixed UUID from a constant string
pub fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).expect("Invalid UUID in test fixture")
}

/// Parse the fixed timestamp
pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

pub fn site_fact(name: &str, status: &str) -> DiscoveryFact {
    DiscoveryFact::Site(SiteFact {
        name: name.to_string(),
        status: status.to_string(),
    })
}

pub fn device_type_fact(model: &str) -> DiscoveryFact {
    DiscoveryFact::DeviceType(DeviceTypeFact {
        manufacturer: "Cisco".to_string(),
        model: model.to_string(),
    })
}

pub fn device_fact(name: &str) -> DiscoveryFact {
    DiscoveryFact::Device(DeviceFact {
        name: name.to_string(),
        site: SITE.to_string(),
        device_type: MODEL.to_string(),
        role: "Access Switch".to_string(),
        status: "alive".to_string(),
        serial: Some(format!("SN-{}", name.to_uppercase())),
    })
}

pub fn interface_fact(device: &str, name: &str) -> DiscoveryFact {
    DiscoveryFact::Interface(InterfaceFact {
        device: device.to_string(),
        name: name.to_string(),
        interface_type: Some("1000base-t".to_string()),
        speed: Some(1_000_000),
        mtu: Some(1500),
        mac_address: None,
        state: "up".to_string(),
    })
}

pub fn ip_fact(address: &str, device: &str, interface: &str) -> DiscoveryFact {
    DiscoveryFact::IpAddress(IpAddressFact {
        address: address.to_string(),
        device: device.to_string(),
        interface: interface.to_string(),
    })
}

/// Batch with fixed id and timestamp
pub fn batch(id: &str, facts: Vec<DiscoveryFact>) -> DiscoveryBatch {
    DiscoveryBatch {
        batch_id: parse_uuid(id),
        observed_at: fixed_timestamp(),
        agent: Some("agent-east".to_string()),
        facts,
    }
}

/// One site, one device type, two devices with two interfaces each and one
/// address per interface: 12 entities.
pub fn topology_facts() -> Vec<DiscoveryFact> {
    let mut facts = vec![site_fact(SITE, "alive"), device_type_fact(MODEL)];
    for (index, device) in ["edge-01", "edge-02"].iter().enumerate() {
        facts.push(device_fact(device));
        for (port, interface) in ["Gi0/1", "Gi0/2"].iter().enumerate() {
            facts.push(interface_fact(device, interface));
            facts.push(ip_fact(
                &format!("10.0.{}.{}/24", index, port + 1),
                device,
                interface,
            ));
        }
    }
    facts
}

pub fn topology_batch() -> DiscoveryBatch {
    batch(BATCH_ID_1, topology_facts())
}

/// Target that blocks lookups of one kind until released
///
/// Each gated lookup signals `entered` before waiting, so a test can act
/// while the call is in flight.
pub struct GatedTarget {
    pub inner: InMemoryTarget,
    gated: EntityKind,
    entered: Notify,
    release: Semaphore,
}

impl GatedTarget {
    pub fn new(gated: EntityKind) -> Self {
        Self {
            inner: InMemoryTarget::new(),
            gated,
            entered: Notify::new(),
            release: Semaphore::new(0),
        }
    }

    /// Wait until a gated lookup is in flight
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let `calls` gated lookups proceed
    pub fn release(&self, calls: usize) {
        self.release.add_permits(calls);
    }
}

#[async_trait]
impl TargetClient for GatedTarget {
    async fn find_by_key(
        &self,
        kind: EntityKind,
        filters: &Filters,
    ) -> Result<Option<RemoteId>, ClientError> {
        if kind == self.gated {
            self.entered.notify_one();
            self.release
                .acquire()
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))?
                .forget();
        }
        self.inner.find_by_key(kind, filters).await
    }

    async fn create(&self, kind: EntityKind, payload: &Value) -> Result<RemoteId, ClientError> {
        self.inner.create(kind, payload).await
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: RemoteId,
        payload: &Value,
    ) -> Result<(), ClientError> {
        self.inner.update(kind, id, payload).await
    }

    async fn health_check(&self) -> Result<(), ClientError> {
        self.inner.health_check().await
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// Target whose health check never answers until `recover` is called
pub struct StalledTarget {
    pub inner: InMemoryTarget,
    stalled: AtomicBool,
}

impl StalledTarget {
    pub fn new() -> Self {
        Self {
            inner: InMemoryTarget::new(),
            stalled: AtomicBool::new(true),
        }
    }

    pub fn recover(&self) {
        self.stalled.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl TargetClient for StalledTarget {
    async fn find_by_key(
        &self,
        kind: EntityKind,
        filters: &Filters,
    ) -> Result<Option<RemoteId>, ClientError> {
        self.inner.find_by_key(kind, filters).await
    }

    async fn create(&self, kind: EntityKind, payload: &Value) -> Result<RemoteId, ClientError> {
        self.inner.create(kind, payload).await
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: RemoteId,
        payload: &Value,
    ) -> Result<(), ClientError> {
        self.inner.update(kind, id, payload).await
    }

    async fn health_check(&self) -> Result<(), ClientError> {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner.health_check().await
    }

    fn name(&self) -> &str {
        "stalled"
    }
}
