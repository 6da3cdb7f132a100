// Copyright (c) 2025 - Cowboy AI, Inc.
//! Batch Reports
//!
//! Per-entity outcomes of one reconciliation pass and the structured log
//! events emitted for them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{EntityKey, RemoteId};
use crate::errors::ReconcileError;

/// Why an entity was not attempted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A dependency failed, was rejected or was itself skipped
    DependencyFailed(EntityKey),
    /// The driver was stopped before the entity was dispatched
    Cancelled,
    /// A later observation of the same key with different references replaced it
    Superseded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DependencyFailed(key) => write!(f, "dependency {} not resolved", key),
            SkipReason::Cancelled => f.write_str("cancelled"),
            SkipReason::Superseded => f.write_str("superseded by a later observation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(RemoteId),
    Updated(RemoteId),
    Skipped(SkipReason),
    Failed(ReconcileError),
}

impl Outcome {
    pub fn remote_id(&self) -> Option<RemoteId> {
        match self {
            Outcome::Created(id) | Outcome::Updated(id) => Some(*id),
            Outcome::Skipped(_) | Outcome::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityOutcome {
    pub key: EntityKey,
    pub outcome: Outcome,
}

impl EntityOutcome {
    pub fn new(key: EntityKey, outcome: Outcome) -> Self {
        Self { key, outcome }
    }

    pub fn failed(key: EntityKey, error: ReconcileError) -> Self {
        Self::new(key, Outcome::Failed(error))
    }

    pub fn skipped(key: EntityKey, reason: SkipReason) -> Self {
        Self::new(key, Outcome::Skipped(reason))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ReportCounts {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.failed
    }
}

/// Result of reconciling one discovery batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub agent: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Outcomes in plan order: planning failures first, then stage by stage
    pub outcomes: Vec<EntityOutcome>,
}

impl BatchReport {
    pub fn counts(&self) -> ReportCounts {
        self.outcomes
            .iter()
            .fold(ReportCounts::default(), |mut counts, entry| {
                match entry.outcome {
                    Outcome::Created(_) => counts.created += 1,
                    Outcome::Updated(_) => counts.updated += 1,
                    Outcome::Skipped(_) => counts.skipped += 1,
                    Outcome::Failed(_) => counts.failed += 1,
                }
                counts
            })
    }

    /// Whether any entity was left undispatched because of a stop request
    pub fn cancelled(&self) -> bool {
        self.outcomes
            .iter()
            .any(|entry| entry.outcome == Outcome::Skipped(SkipReason::Cancelled))
    }

    /// Final outcome for a key
    ///
    /// A key observed more than once reports the superseded observations
    /// ahead of the one that was pushed.
    pub fn outcome(&self, key: &EntityKey) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .rev()
            .find(|entry| &entry.key == key)
            .map(|entry| &entry.outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&EntityKey, &ReconcileError)> {
        self.outcomes.iter().filter_map(|entry| match &entry.outcome {
            Outcome::Failed(error) => Some((&entry.key, error)),
            _ => None,
        })
    }

    /// Emit the batch summary and one event per failed or skipped entity
    pub fn emit(&self) {
        for entry in &self.outcomes {
            match &entry.outcome {
                Outcome::Failed(error) => warn!(
                    batch_id = %self.batch_id,
                    kind = %entry.key.kind,
                    key = %entry.key.key,
                    error = %error,
                    "Entity failed"
                ),
                Outcome::Skipped(reason) => warn!(
                    batch_id = %self.batch_id,
                    kind = %entry.key.kind,
                    key = %entry.key.key,
                    reason = %reason,
                    "Entity skipped"
                ),
                Outcome::Created(_) | Outcome::Updated(_) => {}
            }
        }

        let counts = self.counts();
        info!(
            batch_id = %self.batch_id,
            agent = self.agent.as_deref().unwrap_or("-"),
            created = counts.created,
            updated = counts.updated,
            skipped = counts.skipped,
            failed = counts.failed,
            cancelled = self.cancelled(),
            elapsed_ms = (self.finished_at - self.started_at).num_milliseconds(),
            "Batch reconciled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityKind;

    fn key(name: &str) -> EntityKey {
        EntityKey::new(EntityKind::Device, name)
    }

    #[test]
    fn test_counts() {
        let report = BatchReport {
            batch_id: Uuid::now_v7(),
            agent: None,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            outcomes: vec![
                EntityOutcome::new(key("a"), Outcome::Created(RemoteId(1))),
                EntityOutcome::new(key("b"), Outcome::Updated(RemoteId(2))),
                EntityOutcome::skipped(key("c"), SkipReason::Cancelled),
                EntityOutcome::failed(key("d"), ReconcileError::UnknownStatus("x".into())),
            ],
        };

        let counts = report.counts();
        assert_eq!(
            counts,
            ReportCounts {
                created: 1,
                updated: 1,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(counts.total(), 4);
        assert!(report.cancelled());
        assert_eq!(report.outcome(&key("b")), Some(&Outcome::Updated(RemoteId(2))));
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_outcome_prefers_latest_observation() {
        let report = BatchReport {
            batch_id: Uuid::now_v7(),
            agent: None,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            outcomes: vec![
                EntityOutcome::skipped(key("a"), SkipReason::Superseded),
                EntityOutcome::new(key("a"), Outcome::Created(RemoteId(7))),
            ],
        };

        assert_eq!(report.outcome(&key("a")), Some(&Outcome::Created(RemoteId(7))));
        assert_eq!(report.counts().skipped, 1);
        assert!(!report.cancelled());
        assert_eq!(SkipReason::Superseded.to_string(), "superseded by a later observation");
    }
}
