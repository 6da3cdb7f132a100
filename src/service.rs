// Copyright (c) 2025 - Cowboy AI, Inc.
//! Reconcile Service
//!
//! Async driver owning the consume-normalize-resolve-push loop.
//!
//! # Lifecycle
//!
//! ```text
//! start(): Stopped → Starting → Running
//!          health check target, subscribe source, spawn run loop
//!          any failure → Stopped, error returned to the caller
//!          start future dropped mid-way → Stopped
//!
//! stop():  Running → Stopping → Stopped
//!          cancel session token, await the in-flight batch
//!          no-op when already stopped
//! ```
//!
//! Each running session gets a child of the shutdown token supplied at
//! construction, so cancelling that token also stops the loop. The
//! resolution cache lives for one session: references resolved by an earlier
//! batch satisfy later ones, and `start` begins with an empty cache.

use chrono::Utc;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::ResolutionCache;
use crate::config::ReconcileConfig;
use crate::discovery::DiscoveryBatch;
use crate::errors::{ReconcileError, ReconcileResult};
use crate::reconcile::Reconciler;
use crate::report::BatchReport;
use crate::source::DiscoverySource;
use crate::state_machine::{
    DriverState, LifecycleCommand, LifecycleEffect, StateMachineWithHistory, Transition,
};
use crate::target::TargetClient;

struct Session {
    cancel: CancellationToken,
    handle: JoinHandle<ResolutionCache>,
}

/// Driver reconciling discovery batches into a target
pub struct ReconcileService<T, D>
where
    T: TargetClient + ?Sized + 'static,
    D: DiscoverySource + ?Sized + 'static,
{
    target: Arc<T>,
    source: Arc<D>,
    config: ReconcileConfig,
    shutdown: CancellationToken,
    lifecycle: StateMachineWithHistory<DriverState>,
    session: Option<Session>,
    reports: broadcast::Sender<BatchReport>,
    last_cache: ResolutionCache,
}

impl<T, D> ReconcileService<T, D>
where
    T: TargetClient + ?Sized + 'static,
    D: DiscoverySource + ?Sized + 'static,
{
    pub fn new(
        config: &ReconcileConfig,
        target: Arc<T>,
        source: Arc<D>,
        shutdown: CancellationToken,
    ) -> Self {
        let (reports, _) = broadcast::channel(config.report_buffer.max(1));
        Self {
            target,
            source,
            config: config.clone(),
            shutdown,
            lifecycle: StateMachineWithHistory::new(DriverState::Stopped),
            session: None,
            reports,
            last_cache: ResolutionCache::new(),
        }
    }

    pub fn state(&self) -> DriverState {
        *self.lifecycle.current()
    }

    pub fn lifecycle_history(&self) -> &[Transition<DriverState, LifecycleCommand>] {
        self.lifecycle.history()
    }

    /// Receive every batch report published after this call
    pub fn subscribe_reports(&self) -> broadcast::Receiver<BatchReport> {
        self.reports.subscribe()
    }

    /// Cache left by the most recently stopped session
    pub fn last_session_cache(&self) -> &ResolutionCache {
        &self.last_cache
    }

    /// Whether the run loop has exited on its own (source closed or shutdown)
    pub fn is_finished(&self) -> bool {
        self.session
            .as_ref()
            .map(|session| session.handle.is_finished())
            .unwrap_or(true)
    }

    /// Start the driver
    ///
    /// Fails if the driver is not stopped, the target is unreachable or the
    /// source cannot be subscribed. A failed start leaves the driver stopped,
    /// and so does dropping the returned future before it completes.
    pub async fn start(&mut self) -> ReconcileResult<()> {
        self.advance(LifecycleCommand::Start)?;

        let launch = launch(
            self.target.clone(),
            self.source.clone(),
            Reconciler::new(self.target.clone(), self.config.clone()),
            self.shutdown.child_token(),
            self.reports.clone(),
        );
        let pending = PendingStart::new(&mut self.lifecycle);

        match launch.await {
            Ok(session) => {
                if let Err(err) = pending.settle(LifecycleCommand::Started) {
                    session.cancel.cancel();
                    return Err(err);
                }
                self.session = Some(session);
                info!(
                    target_client = self.target.name(),
                    source = self.source.name(),
                    concurrency = self.config.concurrency,
                    "Reconcile service started"
                );
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "Reconcile service failed to start");
                pending.settle(LifecycleCommand::StartFailed)?;
                Err(err)
            }
        }
    }

    /// Stop the driver, letting the in-flight batch wind down
    ///
    /// Idempotent; stopping a driver that never started is a no-op.
    pub async fn stop(&mut self) -> ReconcileResult<()> {
        if self.advance(LifecycleCommand::Stop)? == LifecycleEffect::NoOp {
            debug!(state = %self.state(), "Stop ignored");
            return Ok(());
        }

        let outcome = match self.session.take() {
            Some(session) => {
                session.cancel.cancel();
                session.handle.await.map_err(|e| {
                    ReconcileError::LoopAborted(format!("reconcile loop panicked: {}", e))
                })
            }
            None => Ok(ResolutionCache::new()),
        };

        self.advance(LifecycleCommand::Drained)?;

        let cache = outcome?;
        info!(resolved = cache.len(), "Reconcile service stopped");
        self.last_cache = cache;
        Ok(())
    }

    fn advance(&mut self, command: LifecycleCommand) -> ReconcileResult<LifecycleEffect> {
        let from = self.state();
        let effect = self.lifecycle.apply(command, Utc::now())?;
        if effect == LifecycleEffect::Transitioned {
            debug!(from = %from, to = %self.state(), ?command, "Driver transition");
        }
        Ok(effect)
    }
}

impl<T, D> Drop for ReconcileService<T, D>
where
    T: TargetClient + ?Sized + 'static,
    D: DiscoverySource + ?Sized + 'static,
{
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel.cancel();
        }
    }
}

/// A start attempt between `Start` and its outcome
///
/// Dropped without `settle` (the `start` future was abandoned), it applies
/// `StartFailed` so the driver is back in `Stopped`.
struct PendingStart<'a> {
    lifecycle: &'a mut StateMachineWithHistory<DriverState>,
    settled: bool,
}

impl<'a> PendingStart<'a> {
    fn new(lifecycle: &'a mut StateMachineWithHistory<DriverState>) -> Self {
        Self {
            lifecycle,
            settled: false,
        }
    }

    fn settle(mut self, command: LifecycleCommand) -> ReconcileResult<LifecycleEffect> {
        self.settled = true;
        let effect = self.lifecycle.apply(command, Utc::now())?;
        debug!(to = %self.lifecycle.current(), ?command, "Driver transition");
        Ok(effect)
    }
}

impl Drop for PendingStart<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        match self.lifecycle.apply(LifecycleCommand::StartFailed, Utc::now()) {
            Ok(_) => warn!("Start abandoned before completion, driver rolled back to Stopped"),
            Err(err) => error!(error = %err, "Failed to roll back abandoned start"),
        }
    }
}

async fn launch<T, D>(
    target: Arc<T>,
    source: Arc<D>,
    reconciler: Reconciler<T>,
    cancel: CancellationToken,
    reports: broadcast::Sender<BatchReport>,
) -> ReconcileResult<Session>
where
    T: TargetClient + ?Sized + 'static,
    D: DiscoverySource + ?Sized + 'static,
{
    target
        .health_check()
        .await
        .map_err(ReconcileError::TargetUnavailable)?;
    debug!(target_client = target.name(), "Target health check passed");

    let batches = source.subscribe().await?;

    let handle = tokio::spawn(run_loop(reconciler, batches, cancel.clone(), reports));

    Ok(Session { cancel, handle })
}

async fn run_loop<T>(
    reconciler: Reconciler<T>,
    mut batches: BoxStream<'static, DiscoveryBatch>,
    cancel: CancellationToken,
    reports: broadcast::Sender<BatchReport>,
) -> ResolutionCache
where
    T: TargetClient + ?Sized + 'static,
{
    let mut cache = ResolutionCache::new();

    loop {
        let batch = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Reconcile loop cancelled");
                break;
            }
            next = batches.next() => match next {
                Some(batch) => batch,
                None => {
                    info!("Discovery stream ended");
                    break;
                }
            },
        };

        let report = reconciler
            .reconcile_batch(&batch, &mut cache, &cancel)
            .await;
        report.emit();

        // No subscribers is fine; reports are also logged.
        let _ = reports.send(report);
    }

    cache
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ChannelSource;
    use crate::target::InMemoryTarget;

    fn service(
        target: Arc<InMemoryTarget>,
    ) -> (
        tokio::sync::mpsc::Sender<DiscoveryBatch>,
        ReconcileService<InMemoryTarget, ChannelSource>,
    ) {
        let (sender, source) = ChannelSource::new(8);
        let service = ReconcileService::new(
            &ReconcileConfig::default(),
            target,
            Arc::new(source),
            CancellationToken::new(),
        );
        (sender, service)
    }

    #[tokio::test]
    async fn test_start_stop() {
        let (_sender, mut service) = service(Arc::new(InMemoryTarget::new()));

        service.start().await.unwrap();
        assert_eq!(service.state(), DriverState::Running);

        service.stop().await.unwrap();
        assert_eq!(service.state(), DriverState::Stopped);
        assert_eq!(service.lifecycle_history().len(), 4);
    }

    #[tokio::test]
    async fn test_unhealthy_target_leaves_driver_stopped() {
        let target = Arc::new(InMemoryTarget::new());
        target.set_unavailable(true).await;
        let (_sender, mut service) = service(target);

        let result = service.start().await;

        assert!(matches!(result, Err(ReconcileError::TargetUnavailable(_))));
        assert_eq!(service.state(), DriverState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let (_sender, mut service) = service(Arc::new(InMemoryTarget::new()));

        service.stop().await.unwrap();
        service.stop().await.unwrap();

        assert_eq!(service.state(), DriverState::Stopped);
        assert!(service.lifecycle_history().is_empty());
    }
}
