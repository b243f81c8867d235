// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync queue manager.
//!
//! Orchestrates the mutation lifecycle:
//! - Immediate execution while online
//! - Durable queuing while offline or after a failed attempt
//! - Periodic and reconnect-triggered drains with bounded retries
//! - Drop notifications once a mutation is abandoned

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use offsync_core::{Mutation, MutationAction, MutationId, PendingMutation};
use serde_json::Value;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::connectivity::{ConnectivityEvents, ConnectivityMonitor};
use super::executor::{ExecuteError, RemoteMutationExecutor};
use super::store::{JsonlQueueStore, SyncQueueStore};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Shortest accepted interval between periodic drains.
pub const MIN_DRAIN_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for the sync queue manager.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Interval between periodic drains while online.
    pub drain_interval: Duration,
    /// Failed attempts tolerated before a mutation is dropped.
    pub max_retries: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            drain_interval: Duration::from_secs(30),
            max_retries: 5,
        }
    }
}

/// Error type for sync queue operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The mutation failed validation and was neither executed nor queued.
    #[error(transparent)]
    InvalidMutation(#[from] offsync_core::Error),
}

/// Result type for sync queue operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// What `enqueue` did with a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Applied to the remote store right away.
    Executed(MutationId),
    /// Persisted for a later drain.
    Queued(MutationId),
}

impl EnqueueOutcome {
    pub fn id(&self) -> &MutationId {
        match self {
            EnqueueOutcome::Executed(id) | EnqueueOutcome::Queued(id) => id,
        }
    }
}

/// Why a mutation was permanently dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Retry count exceeded the configured threshold.
    RetriesExhausted,
    /// The remote store rejected the mutation.
    Rejected(String),
}

/// A mutation that left the queue without being applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedMutation {
    /// The entry with terminal `failed` status.
    pub mutation: PendingMutation,
    pub reason: DropReason,
}

/// Summary of one drain pass.
///
/// Dropped entries are listed in full so callers can report or persist them
/// without relying on event delivery.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrainReport {
    pub attempted: usize,
    pub applied: usize,
    pub retried: usize,
    pub dropped: Vec<DroppedMutation>,
    /// Queue length after the pass, including entries enqueued during it.
    pub remaining: usize,
}

/// Result of a `drain` call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrainOutcome {
    Completed(DrainReport),
    /// Another drain held the single-flight guard; nothing was attempted.
    AlreadyRunning,
    /// Drains only run while online; nothing was attempted.
    Offline,
}

/// Observable lifecycle events.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Executed(MutationId),
    Queued(MutationId),
    Applied(MutationId),
    Retrying { id: MutationId, retry_count: u32 },
    /// The mutation left the queue with terminal `failed` status.
    Dropped {
        mutation: PendingMutation,
        reason: DropReason,
    },
    DrainFinished(DrainReport),
}

/// Per-entry result of a drain pass, merged back into the live queue.
enum EntryOutcome {
    Remove,
    Retry(u32),
}

/// Offline mutation sync queue.
///
/// Cheap to clone; clones share the same queue. The composition root owns the
/// instance and hands clones to consumers.
pub struct SyncQueueManager<E, S = JsonlQueueStore> {
    inner: Arc<Inner<E, S>>,
}

struct Inner<E, S> {
    config: SyncConfig,
    executor: E,
    store: S,
    monitor: ConnectivityMonitor,
    /// In-memory copy of the persisted queue, FIFO.
    queue: Mutex<Vec<PendingMutation>>,
    /// Single-flight guard for `drain`.
    draining: Mutex<()>,
    events: broadcast::Sender<SyncEvent>,
}

impl<E, S> Clone for SyncQueueManager<E, S> {
    fn clone(&self) -> Self {
        SyncQueueManager {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: RemoteMutationExecutor, S: SyncQueueStore> SyncQueueManager<E, S> {
    /// Creates a manager and restores the persisted queue from `store`.
    ///
    /// A `drain_interval` below [`MIN_DRAIN_INTERVAL`] is raised to it.
    pub fn new(
        mut config: SyncConfig,
        executor: E,
        store: S,
        monitor: ConnectivityMonitor,
    ) -> Self {
        if config.drain_interval < MIN_DRAIN_INTERVAL {
            warn!(requested = ?config.drain_interval, "drain interval too short, using minimum");
            config.drain_interval = MIN_DRAIN_INTERVAL;
        }

        let queue = store.load();
        if !queue.is_empty() {
            info!(entries = queue.len(), "restored pending mutations");
        }
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        SyncQueueManager {
            inner: Arc::new(Inner {
                config,
                executor,
                store,
                monitor,
                queue: Mutex::new(queue),
                draining: Mutex::new(()),
                events,
            }),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    pub fn monitor(&self) -> &ConnectivityMonitor {
        &self.inner.monitor
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn executor(&self) -> &E {
        &self.inner.executor
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    /// Snapshot of the queued mutations in FIFO order.
    pub async fn pending(&self) -> Vec<PendingMutation> {
        self.inner.queue.lock().await.clone()
    }

    /// Apply a mutation now if possible, otherwise queue it durably.
    ///
    /// Executor and storage failures are never returned: a failed immediate
    /// attempt falls through to queuing, and a failed save keeps the entry in
    /// memory until the next successful save.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidMutation`] if the inputs do not describe a
    /// valid mutation (missing collection, missing document id for
    /// update/delete, missing payload for create/update).
    pub async fn enqueue(
        &self,
        collection: &str,
        document_id: Option<&str>,
        action: MutationAction,
        data: Option<Value>,
    ) -> SyncResult<EnqueueOutcome> {
        let now = Utc::now();
        let mutation = Mutation::new(
            collection,
            document_id.map(String::from),
            action,
            data,
            &now,
        )?;
        let id = mutation.id.clone();

        if self.inner.monitor.is_online() {
            match self.inner.executor.execute(&mutation).await {
                Ok(()) => {
                    debug!(id = %id, collection, %action, "mutation executed");
                    self.emit(SyncEvent::Executed(id.clone()));
                    return Ok(EnqueueOutcome::Executed(id));
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "immediate execution failed, queueing");
                }
            }
        }

        {
            let mut queue = self.inner.queue.lock().await;
            queue.push(PendingMutation::new(mutation, now));
            self.persist(&queue);
            debug!(id = %id, collection, %action, entries = queue.len(), "mutation queued");
        }
        self.emit(SyncEvent::Queued(id.clone()));
        Ok(EnqueueOutcome::Queued(id))
    }

    /// Attempt every queued mutation once, in FIFO order.
    ///
    /// Successes leave the queue. Transient failures bump the retry count and
    /// drop the entry once it exceeds `max_retries`; rejections are dropped
    /// immediately. Per-entry failures never abort the pass.
    pub async fn drain(&self) -> DrainOutcome {
        let Ok(_guard) = self.inner.draining.try_lock() else {
            debug!("drain already in progress, skipping");
            return DrainOutcome::AlreadyRunning;
        };

        if !self.inner.monitor.is_online() {
            debug!("offline, skipping drain");
            return DrainOutcome::Offline;
        }

        // The queue lock is released while executing so enqueue stays responsive.
        let snapshot = self.inner.queue.lock().await.clone();
        if snapshot.is_empty() {
            return DrainOutcome::Completed(DrainReport::default());
        }

        info!(entries = snapshot.len(), "draining sync queue");
        let max_retries = self.inner.config.max_retries;
        let mut report = DrainReport::default();
        let mut outcomes = HashMap::with_capacity(snapshot.len());

        for mut entry in snapshot {
            report.attempted += 1;
            let id = entry.id().clone();

            match self.inner.executor.execute(&entry.mutation).await {
                Ok(()) => {
                    report.applied += 1;
                    outcomes.insert(id.clone(), EntryOutcome::Remove);
                    self.emit(SyncEvent::Applied(id));
                }
                Err(ExecuteError::Rejected(message)) => {
                    entry.record_failure(max_retries);
                    entry.mark_failed();
                    warn!(id = %id, reason = %message, "mutation rejected, dropping");
                    outcomes.insert(id, EntryOutcome::Remove);
                    self.drop_entry(&mut report, entry, DropReason::Rejected(message));
                }
                Err(e) => {
                    if entry.record_failure(max_retries) {
                        warn!(
                            id = %id,
                            retries = entry.retry_count,
                            error = %e,
                            "retries exhausted, dropping mutation"
                        );
                        outcomes.insert(id, EntryOutcome::Remove);
                        self.drop_entry(&mut report, entry, DropReason::RetriesExhausted);
                    } else {
                        report.retried += 1;
                        debug!(
                            id = %id,
                            retries = entry.retry_count,
                            error = %e,
                            "mutation failed, will retry"
                        );
                        outcomes.insert(id.clone(), EntryOutcome::Retry(entry.retry_count));
                        self.emit(SyncEvent::Retrying {
                            id,
                            retry_count: entry.retry_count,
                        });
                    }
                }
            }
        }

        // Merge by id so entries enqueued during the pass are kept.
        {
            let mut queue = self.inner.queue.lock().await;
            queue.retain_mut(|entry| match outcomes.get(entry.id()) {
                Some(EntryOutcome::Remove) => false,
                Some(EntryOutcome::Retry(count)) => {
                    entry.retry_count = entry.retry_count.max(*count);
                    true
                }
                None => true,
            });
            report.remaining = queue.len();
            self.persist(&queue);
        }

        info!(
            attempted = report.attempted,
            applied = report.applied,
            retried = report.retried,
            dropped = report.dropped.len(),
            remaining = report.remaining,
            "drain finished"
        );
        self.emit(SyncEvent::DrainFinished(report.clone()));
        DrainOutcome::Completed(report)
    }

    fn drop_entry(
        &self,
        report: &mut DrainReport,
        mutation: PendingMutation,
        reason: DropReason,
    ) {
        self.emit(SyncEvent::Dropped {
            mutation: mutation.clone(),
            reason: reason.clone(),
        });
        report.dropped.push(DroppedMutation { mutation, reason });
    }

    fn persist(&self, queue: &[PendingMutation]) {
        if let Err(e) = self.inner.store.save(queue) {
            error!(error = %e, entries = queue.len(), "failed to persist sync queue");
        }
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }
}

impl<E, S> SyncQueueManager<E, S>
where
    E: RemoteMutationExecutor + 'static,
    S: SyncQueueStore + 'static,
{
    /// Spawns the periodic drain timer and the reconnect listener.
    ///
    /// Must be called from within a tokio runtime. The returned handle stops
    /// both tasks when disposed or dropped.
    pub fn start(&self) -> SyncHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let timer = tokio::spawn(drain_periodically(self.clone(), shutdown_rx.clone()));
        let listener = tokio::spawn(drain_on_reconnect(
            self.clone(),
            self.inner.monitor.subscribe(),
            shutdown_rx,
        ));

        info!(
            interval_secs = self.inner.config.drain_interval.as_secs(),
            "sync queue started"
        );
        SyncHandle {
            shutdown: shutdown_tx,
            tasks: vec![timer, listener],
        }
    }
}

/// Background tasks of a started [`SyncQueueManager`].
///
/// Dropping the handle signals shutdown as well, so the tasks stop on every
/// exit path of the owner.
pub struct SyncHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SyncHandle {
    /// Stops the timer and detaches from connectivity events.
    ///
    /// A drain already in flight runs to completion before this returns.
    pub async fn dispose(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "sync task ended abnormally");
            }
        }
        info!("sync queue stopped");
    }
}

async fn drain_periodically<E, S>(
    manager: SyncQueueManager<E, S>,
    mut shutdown: watch::Receiver<bool>,
) where
    E: RemoteMutationExecutor,
    S: SyncQueueStore,
{
    let period = manager.inner.config.drain_interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }
        if manager.inner.monitor.is_online() {
            manager.drain().await;
        }
    }
}

async fn drain_on_reconnect<E, S>(
    manager: SyncQueueManager<E, S>,
    mut events: ConnectivityEvents,
    mut shutdown: watch::Receiver<bool>,
) where
    E: RemoteMutationExecutor,
    S: SyncQueueStore,
{
    loop {
        tokio::select! {
            event = events.next_online() => {
                if event.is_none() {
                    break;
                }
            }
            _ = shutdown.changed() => break,
        }
        info!("connectivity restored, draining");
        manager.drain().await;
    }
}
