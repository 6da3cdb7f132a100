// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pusher / Reconciler
//!
//! Executes a [`Plan`] against a [`TargetClient`].
//!
//! # Execution Model
//!
//! ```text
//! for each stage (strictly sequential):
//!     cancelled?            → remaining entities Skipped(Cancelled)
//!     dependency failed?    → Skipped(DependencyFailed)
//!     otherwise dispatch    → bounded pool of `concurrency` upserts
//!     drain, then write resolved ids into the cache
//! ```
//!
//! Upserts are create-or-update: find by natural key, then `update` the
//! mutable fields or `create`. Running the same batch twice yields the same
//! objects; the second run is all updates.
//!
//! A failed entity never aborts the plan. Retryable remote errors are
//! retried at most `remote_retries` times.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::ResolutionCache;
use crate::config::ReconcileConfig;
use crate::discovery::DiscoveryBatch;
use crate::domain::{EntityKey, EntityKind, NormalizedEntity, RemoteId};
use crate::errors::ReconcileError;
use crate::normalize::normalize_batch;
use crate::payload::UpsertRequest;
use crate::plan::{resolve, Plan};
use crate::report::{BatchReport, EntityOutcome, Outcome, SkipReason};
use crate::target::{ClientError, TargetClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Created,
    Updated,
}

/// Successful upsert of one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upserted {
    pub id: RemoteId,
    pub action: UpsertAction,
}

impl From<Upserted> for Outcome {
    fn from(upserted: Upserted) -> Self {
        match upserted.action {
            UpsertAction::Created => Outcome::Created(upserted.id),
            UpsertAction::Updated => Outcome::Updated(upserted.id),
        }
    }
}

/// Pushes normalized entities to a target
pub struct Reconciler<T: TargetClient + ?Sized> {
    target: Arc<T>,
    config: ReconcileConfig,
}

impl<T: TargetClient + ?Sized> Reconciler<T> {
    pub fn new(target: Arc<T>, config: ReconcileConfig) -> Self {
        Self { target, config }
    }

    /// Create or update one entity
    ///
    /// References are resolved through `cache`; a missing id fails with
    /// `UnresolvedReference` without calling the target.
    pub async fn upsert(
        &self,
        entity: &NormalizedEntity,
        cache: &ResolutionCache,
    ) -> Result<Upserted, ReconcileError> {
        let kind = entity.kind();
        let request = UpsertRequest::build(entity, cache)?;

        let mut attempt = 0;
        loop {
            match self.try_upsert(kind, &request).await {
                Ok(upserted) => return Ok(upserted),
                Err(error) if error.is_retryable() && attempt < self.config.remote_retries => {
                    attempt += 1;
                    debug!(
                        kind = %kind,
                        key = %entity.key().key,
                        attempt,
                        error = %error,
                        "Retrying upsert"
                    );
                }
                Err(error) => return Err(ReconcileError::RemoteCall(error)),
            }
        }
    }

    async fn try_upsert(
        &self,
        kind: EntityKind,
        request: &UpsertRequest,
    ) -> Result<Upserted, ClientError> {
        match self.target.find_by_key(kind, &request.filters).await? {
            Some(id) => {
                self.target.update(kind, id, &request.body).await?;
                Ok(Upserted {
                    id,
                    action: UpsertAction::Updated,
                })
            }
            None => {
                let id = self.target.create(kind, &request.body).await?;
                Ok(Upserted {
                    id,
                    action: UpsertAction::Created,
                })
            }
        }
    }

    /// Execute a plan stage by stage
    ///
    /// Returns one outcome per entity: the plan's settled outcomes first, then
    /// every scheduled entity in plan order. The cache is written only after
    /// each stage drains and only with resolved ids.
    pub async fn execute(
        &self,
        plan: Plan,
        cache: &mut ResolutionCache,
        cancel: &CancellationToken,
    ) -> Vec<EntityOutcome> {
        let mut outcomes = plan.settled;
        let mut unresolved: HashSet<EntityKey> =
            outcomes.iter().map(|entry| entry.key.clone()).collect();
        let concurrency = self.config.concurrency.max(1);

        for stage in plan.stages {
            if cancel.is_cancelled() {
                debug!(stage = stage.index, "Stage not started: cancelled");
                outcomes.extend(stage.entities.iter().map(|entity| {
                    EntityOutcome::skipped(entity.key(), SkipReason::Cancelled)
                }));
                continue;
            }

            let mut slots: Vec<Option<Outcome>> = vec![None; stage.entities.len()];
            let mut dispatch = Vec::with_capacity(stage.entities.len());

            for (index, entity) in stage.entities.iter().enumerate() {
                let failed_dependency = entity
                    .dependencies()
                    .into_iter()
                    .find(|dependency| unresolved.contains(dependency));
                match failed_dependency {
                    Some(dependency) => {
                        slots[index] = Some(Outcome::Skipped(SkipReason::DependencyFailed(
                            dependency,
                        )))
                    }
                    None => dispatch.push((index, entity.clone())),
                }
            }

            debug!(
                stage = stage.index,
                dispatched = dispatch.len(),
                skipped = stage.entities.len() - dispatch.len(),
                "Executing stage"
            );

            let snapshot: &ResolutionCache = cache;
            let results: Vec<(usize, Outcome)> = stream::iter(dispatch)
                .map(|(index, entity)| self.dispatch(index, entity, snapshot, cancel))
                .buffer_unordered(concurrency)
                .collect()
                .await;

            for (index, outcome) in results {
                slots[index] = Some(outcome);
            }

            for (entity, slot) in stage.entities.iter().zip(slots) {
                let key = entity.key();
                let outcome = slot.unwrap_or(Outcome::Skipped(SkipReason::Cancelled));
                match outcome.remote_id() {
                    Some(id) => {
                        cache.insert(key.clone(), id);
                    }
                    None => {
                        unresolved.insert(key.clone());
                    }
                }
                outcomes.push(EntityOutcome::new(key, outcome));
            }
        }

        outcomes
    }

    async fn dispatch(
        &self,
        index: usize,
        entity: NormalizedEntity,
        cache: &ResolutionCache,
        cancel: &CancellationToken,
    ) -> (usize, Outcome) {
        if cancel.is_cancelled() {
            return (index, Outcome::Skipped(SkipReason::Cancelled));
        }

        let outcome = match self.upsert(&entity, cache).await {
            Ok(upserted) => Outcome::from(upserted),
            Err(error) => {
                warn!(
                    kind = %entity.kind(),
                    key = %entity.key().key,
                    error = %error,
                    "Upsert failed"
                );
                Outcome::Failed(error)
            }
        };
        (index, outcome)
    }

    /// Normalize, plan and push one discovery batch
    pub async fn reconcile_batch(
        &self,
        batch: &DiscoveryBatch,
        cache: &mut ResolutionCache,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let started_at = Utc::now();

        let (entities, rejections) = normalize_batch(&batch.facts);
        let plan = resolve(entities, rejections, cache);
        debug!(
            batch_id = %batch.batch_id,
            facts = batch.len(),
            scheduled = plan.scheduled(),
            settled = plan.settled.len(),
            stages = plan.stages.len(),
            "Batch planned"
        );

        let outcomes = self.execute(plan, cache, cancel).await;

        BatchReport {
            batch_id: batch.batch_id,
            agent: batch.agent.clone(),
            started_at,
            finished_at: Utc::now(),
            outcomes,
        }
    }
}
