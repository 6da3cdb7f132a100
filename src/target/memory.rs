// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-Memory Target
//!
//! Collects pushed objects in process instead of calling NetBox. Used for
//! dry runs and as the test double for the reconciler.
//!
//! Lookup filters follow NetBox query conventions: a `<field>_id` filter
//! matches the numeric `<field>` reference in the stored payload, any other
//! filter matches the field's string value.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::{ClientError, Filters, TargetClient};
use crate::domain::{EntityKind, RemoteId};

/// Number of calls made per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub finds: usize,
    pub creates: usize,
    pub updates: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.finds + self.creates + self.updates
    }
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    kind: EntityKind,
    field: &'static str,
    value: String,
    /// Remaining failures, `None` for every call
    remaining: Option<u32>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    objects: BTreeMap<EntityKind, BTreeMap<RemoteId, Value>>,
    failures: Vec<InjectedFailure>,
    calls: CallCounts,
    unavailable: bool,
}

impl State {
    fn allocate(&mut self) -> RemoteId {
        self.next_id += 1;
        RemoteId(self.next_id)
    }

    /// Consume an injected failure matching the call, if any
    fn take_failure<'a>(
        &mut self,
        kind: EntityKind,
        fields: impl Iterator<Item = (&'a str, String)>,
    ) -> Option<ClientError> {
        let fields: Vec<(&str, String)> = fields.collect();
        let failure = self.failures.iter_mut().find(|failure| {
            failure.kind == kind
                && failure.remaining != Some(0)
                && fields
                    .iter()
                    .any(|(field, value)| *field == failure.field && *value == failure.value)
        })?;

        if let Some(remaining) = failure.remaining.as_mut() {
            *remaining -= 1;
        }

        Some(ClientError::Status {
            status: 500,
            body: format!("injected failure for {} {}", kind, failure.value),
        })
    }
}

/// Target that stores objects in memory
#[derive(Debug, Default)]
pub struct InMemoryTarget {
    state: Mutex<State>,
}

impl InMemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail calls for `kind` whose payload or filters carry `field == value`
    ///
    /// `times` limits how many calls fail; `None` fails every call.
    pub async fn fail_on(
        &self,
        kind: EntityKind,
        field: &'static str,
        value: impl Into<String>,
        times: Option<u32>,
    ) {
        self.state.lock().await.failures.push(InjectedFailure {
            kind,
            field,
            value: value.into(),
            remaining: times,
        });
    }

    /// Make `health_check` fail
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().await.unavailable = unavailable;
    }

    /// Store an object directly, bypassing failure injection
    pub async fn seed(&self, kind: EntityKind, payload: Value) -> RemoteId {
        let mut state = self.state.lock().await;
        let id = state.allocate();
        state.objects.entry(kind).or_default().insert(id, payload);
        id
    }

    pub async fn objects(&self, kind: EntityKind) -> Vec<(RemoteId, Value)> {
        self.state
            .lock()
            .await
            .objects
            .get(&kind)
            .map(|objects| {
                objects
                    .iter()
                    .map(|(id, payload)| (*id, payload.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn get(&self, kind: EntityKind, id: RemoteId) -> Option<Value> {
        self.state
            .lock()
            .await
            .objects
            .get(&kind)
            .and_then(|objects| objects.get(&id))
            .cloned()
    }

    pub async fn count(&self, kind: EntityKind) -> usize {
        self.state
            .lock()
            .await
            .objects
            .get(&kind)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    /// Objects stored across all kinds
    pub async fn total(&self) -> usize {
        self.state
            .lock()
            .await
            .objects
            .values()
            .map(BTreeMap::len)
            .sum()
    }

    pub async fn calls(&self) -> CallCounts {
        self.state.lock().await.calls
    }
}

fn payload_fields(payload: &Value) -> impl Iterator<Item = (&str, String)> {
    payload
        .as_object()
        .into_iter()
        .flat_map(Map::iter)
        .filter_map(|(field, value)| scalar(value).map(|value| (field.as_str(), value)))
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn matches_filter(payload: &Value, field: &str, expected: &str) -> bool {
    let field = field.strip_suffix("_id").unwrap_or(field);
    payload
        .get(field)
        .and_then(scalar)
        .map(|actual| actual == expected)
        .unwrap_or(false)
}

#[async_trait]
impl TargetClient for InMemoryTarget {
    async fn find_by_key(
        &self,
        kind: EntityKind,
        filters: &Filters,
    ) -> Result<Option<RemoteId>, ClientError> {
        let mut state = self.state.lock().await;
        state.calls.finds += 1;

        let lookup = filters
            .iter()
            .map(|(field, value)| (field.strip_suffix("_id").unwrap_or(*field), value.clone()));
        if let Some(error) = state.take_failure(kind, lookup) {
            return Err(error);
        }

        let matches: Vec<RemoteId> = state
            .objects
            .get(&kind)
            .map(|objects| {
                objects
                    .iter()
                    .filter(|(_, payload)| {
                        filters
                            .iter()
                            .all(|(field, value)| matches_filter(payload, field, value))
                    })
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default();

        match matches.as_slice() {
            [] => Ok(None),
            [id] => Ok(Some(*id)),
            many => Err(ClientError::Ambiguous {
                kind,
                count: many.len() as u64,
            }),
        }
    }

    async fn create(&self, kind: EntityKind, payload: &Value) -> Result<RemoteId, ClientError> {
        let mut state = self.state.lock().await;
        state.calls.creates += 1;

        if let Some(error) = state.take_failure(kind, payload_fields(payload)) {
            return Err(error);
        }

        let id = state.allocate();
        state
            .objects
            .entry(kind)
            .or_default()
            .insert(id, payload.clone());
        debug!(kind = %kind, id = %id, "Created in-memory object");
        Ok(id)
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: RemoteId,
        payload: &Value,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        state.calls.updates += 1;

        if let Some(error) = state.take_failure(kind, payload_fields(payload)) {
            return Err(error);
        }

        let existing = state
            .objects
            .get_mut(&kind)
            .and_then(|objects| objects.get_mut(&id))
            .ok_or_else(|| ClientError::Status {
                status: 404,
                body: format!("{} {} not found", kind, id),
            })?;

        match (existing.as_object_mut(), payload.as_object()) {
            (Some(existing), Some(patch)) => {
                for (field, value) in patch {
                    existing.insert(field.clone(), value.clone());
                }
            }
            _ => *existing = payload.clone(),
        }
        debug!(kind = %kind, id = %id, "Updated in-memory object");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ClientError> {
        if self.state.lock().await.unavailable {
            return Err(ClientError::Transport("in-memory target unavailable".to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
