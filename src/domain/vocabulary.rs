// Copyright (c) 2025 - Cowboy AI, Inc.
//! Vocabulary Tables and Numeric Bounds
//!
//! Fixed lookup tables translating the discovery agent's vocabulary into the
//! NetBox vocabulary, and the numeric domains NetBox enforces on interfaces.
//!
//! Lookups are exact: anything outside a table is an error, never a default.
//!
//! | table       | source  | target    |
//! |-------------|---------|-----------|
//! | status      | `alive` | `active`  |
//! | status      | `dead`  | `offline` |
//! | link state  | `up`    | `true`    |
//! | link state  | `down`  | `false`   |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ReconcileError;

/// Largest interface speed NetBox stores (signed 32-bit column, kbps)
pub const INTERFACE_SPEED_MAX: i64 = 2_147_483_647;

/// Smallest interface speed
pub const INTERFACE_SPEED_MIN: i64 = 0;

/// Smallest interface MTU
pub const INTERFACE_MTU_MIN: i64 = 1;

/// Assigned-object discriminator for IP addresses bound to a device interface
pub const INTERFACE_OBJECT_TYPE: &str = "dcim.interface";

/// Target status vocabulary shared by sites and devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Offline,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Offline => "offline",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable source → target lookup table
#[derive(Debug)]
pub struct Vocabulary<V: 'static> {
    name: &'static str,
    entries: &'static [(&'static str, V)],
}

impl<V: Copy> Vocabulary<V> {
    pub const fn new(name: &'static str, entries: &'static [(&'static str, V)]) -> Self {
        Self { name, entries }
    }

    /// Table name, used in diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Exact lookup of a source term
    pub fn lookup(&self, source: &str) -> Option<V> {
        self.entries
            .iter()
            .find(|(term, _)| *term == source)
            .map(|(_, value)| *value)
    }

    /// All source terms the table knows
    pub fn sources(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(term, _)| *term)
    }
}

/// Agent status → NetBox status
pub static STATUS_VOCABULARY: Vocabulary<Status> = Vocabulary::new(
    "status",
    &[("alive", Status::Active), ("dead", Status::Offline)],
);

/// Agent link state → NetBox `enabled` flag
pub static LINK_STATE_VOCABULARY: Vocabulary<bool> =
    Vocabulary::new("link state", &[("up", true), ("down", false)]);

/// Map an agent status term, failing on anything outside the table
pub fn map_status(source: &str) -> Result<Status, ReconcileError> {
    STATUS_VOCABULARY
        .lookup(source)
        .ok_or_else(|| ReconcileError::UnknownStatus(source.to_string()))
}

/// Map an agent link-state term, failing on anything outside the table
pub fn map_link_state(source: &str) -> Result<bool, ReconcileError> {
    LINK_STATE_VOCABULARY
        .lookup(source)
        .ok_or_else(|| ReconcileError::UnknownState(source.to_string()))
}

/// Inclusive integer bounds, optionally open above
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub min: i64,
    pub max: Option<i64>,
}

impl Bounds {
    pub const fn between(min: i64, max: i64) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub const fn at_least(min: i64) -> Self {
        Self { min, max: None }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && self.max.map_or(true, |max| value <= max)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}, {}]", self.min, max),
            None => write!(f, "[{}, ∞)", self.min),
        }
    }
}

pub const SPEED_BOUNDS: Bounds = Bounds::between(INTERFACE_SPEED_MIN, INTERFACE_SPEED_MAX);

pub const MTU_BOUNDS: Bounds = Bounds::at_least(INTERFACE_MTU_MIN);
