// Copyright (c) 2025 - Cowboy AI, Inc.
//! Dependency Resolver
//!
//! Orders a normalized batch into stages that respect the NetBox foreign-key
//! DAG and settles, before any remote call, every entity that cannot be
//! linked correctly.
//!
//! # Stages
//!
//! ```text
//! stage 0: Site, DeviceType      (independent of each other)
//! stage 1: Device                (needs Site, DeviceType)
//! stage 2: Interface             (needs Device)
//! stage 3: IpAddress             (needs Interface)
//! ```
//!
//! A reference is satisfiable when its key is already in the resolution
//! cache or is scheduled earlier in the same plan. Otherwise the referencing
//! entity fails with `UnresolvedReference`, and everything below it in the
//! DAG is skipped.

use std::collections::{HashMap, HashSet};

use crate::cache::ResolutionCache;
use crate::domain::{EntityKey, EntityKind, NormalizedEntity};
use crate::errors::ReconcileError;
use crate::normalize::Rejection;
use crate::report::{EntityOutcome, SkipReason};

/// Entities of one or more independent kinds pushed together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub index: usize,
    pub entities: Vec<NormalizedEntity>,
}

/// Ordered upsert plan for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Non-empty stages in execution order
    pub stages: Vec<Stage>,
    /// Entities settled during planning (rejected, unresolved, skipped)
    pub settled: Vec<EntityOutcome>,
}

impl Plan {
    /// Number of entities scheduled for a remote upsert
    pub fn scheduled(&self) -> usize {
        self.stages.iter().map(|stage| stage.entities.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty() && self.settled.is_empty()
    }

    pub fn scheduled_keys(&self) -> impl Iterator<Item = EntityKey> + '_ {
        self.stages
            .iter()
            .flat_map(|stage| stage.entities.iter().map(NormalizedEntity::key))
    }
}

/// Build the ordered plan for a batch
///
/// `rejections` are facts the normalizer refused; they are reported as failed
/// and their dependents are skipped. Duplicate keys merge: the later entity
/// replaces the earlier one but keeps its position. An earlier observation
/// whose references differ from its replacement is reported as
/// [`SkipReason::Superseded`].
pub fn resolve(
    entities: Vec<NormalizedEntity>,
    rejections: Vec<Rejection>,
    cache: &ResolutionCache,
) -> Plan {
    let mut settled = Vec::with_capacity(rejections.len());
    let mut blocked: HashSet<EntityKey> = HashSet::new();

    for rejection in rejections {
        blocked.insert(rejection.key.clone());
        settled.push(EntityOutcome::failed(rejection.key, rejection.error));
    }

    let rejected = blocked.clone();

    let (unique, superseded) = dedup(entities);
    settled.extend(superseded);

    let mut buckets: Vec<Vec<NormalizedEntity>> = vec![Vec::new(); EntityKind::STAGE_COUNT];
    for entity in unique {
        buckets[entity.kind().stage()].push(entity);
    }

    let mut planned: HashSet<EntityKey> = HashSet::new();
    let mut stages = Vec::new();

    for (index, bucket) in buckets.into_iter().enumerate() {
        let mut scheduled = Vec::with_capacity(bucket.len());

        for entity in bucket {
            let key = entity.key();
            // A rejected observation of the same key is already reported
            if rejected.contains(&key) {
                continue;
            }
            match check_dependencies(&entity, &blocked, &planned, cache) {
                Ok(()) => {
                    planned.insert(key);
                    scheduled.push(entity);
                }
                Err(outcome) => {
                    blocked.insert(key.clone());
                    settled.push(EntityOutcome::new(key, outcome));
                }
            }
        }

        if !scheduled.is_empty() {
            stages.push(Stage {
                index,
                entities: scheduled,
            });
        }
    }

    Plan { stages, settled }
}

fn check_dependencies(
    entity: &NormalizedEntity,
    blocked: &HashSet<EntityKey>,
    planned: &HashSet<EntityKey>,
    cache: &ResolutionCache,
) -> Result<(), crate::report::Outcome> {
    use crate::report::Outcome;

    for dependency in entity.dependencies() {
        if blocked.contains(&dependency) {
            return Err(Outcome::Skipped(SkipReason::DependencyFailed(dependency)));
        }
        if !planned.contains(&dependency) && !cache.contains(&dependency) {
            return Err(Outcome::Failed(ReconcileError::UnresolvedReference(
                dependency,
            )));
        }
    }
    Ok(())
}

fn dedup(entities: Vec<NormalizedEntity>) -> (Vec<NormalizedEntity>, Vec<EntityOutcome>) {
    let mut positions: HashMap<EntityKey, usize> = HashMap::with_capacity(entities.len());
    let mut unique: Vec<NormalizedEntity> = Vec::with_capacity(entities.len());
    let mut superseded = Vec::new();

    for entity in entities {
        let key = entity.key();
        match positions.get(&key) {
            Some(&position) => {
                let replaced = std::mem::replace(&mut unique[position], entity);
                if replaced.dependencies() != unique[position].dependencies() {
                    superseded.push(EntityOutcome::skipped(key, SkipReason::Superseded));
                }
            }
            None => {
                positions.insert(key, unique.len());
                unique.push(entity);
            }
        }
    }

    (unique, superseded)
}
