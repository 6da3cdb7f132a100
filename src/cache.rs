// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resolution Cache
//!
//! Maps local natural keys to identifiers assigned by the target system.
//! Written only between stages, after a stage's upserts have drained, and
//! read-only while a stage is in flight; it therefore needs no locking.

use std::collections::HashMap;

use crate::domain::{EntityKey, RemoteId};
use crate::errors::ReconcileError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionCache {
    ids: HashMap<EntityKey, RemoteId>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &EntityKey) -> Option<RemoteId> {
        self.ids.get(key).copied()
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.ids.contains_key(key)
    }

    /// Remote id for a dependency, or `UnresolvedReference`
    pub fn require(&self, key: &EntityKey) -> Result<RemoteId, ReconcileError> {
        self.get(key)
            .ok_or_else(|| ReconcileError::UnresolvedReference(key.clone()))
    }

    /// Record a resolved id, returning the previous one if the key was known
    pub fn insert(&mut self, key: EntityKey, id: RemoteId) -> Option<RemoteId> {
        self.ids.insert(key, id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
