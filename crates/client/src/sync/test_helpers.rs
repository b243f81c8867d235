// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use offsync_core::{Mutation, MutationAction, MutationId, PendingMutation};
use serde_json::json;
use tokio::sync::{Notify, Semaphore};

use super::executor::{ExecuteError, ExecuteFuture, ExecuteResult, RemoteMutationExecutor};

/// Create a queue entry with a fixed id and enqueue time.
pub fn make_pending(id: &str, collection: &str, document: &str) -> PendingMutation {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let mutation = Mutation::new(
        collection,
        Some(document.to_string()),
        MutationAction::Update,
        Some(json!({ "document": document })),
        &at,
    )
    .unwrap()
    .with_id(MutationId::new(id));
    PendingMutation::new(mutation, at)
}

/// Scriptable executor that records every call.
///
/// Results come from the script first, then from the fallback. A gated
/// executor parks each call until a permit is added to its semaphore.
#[derive(Clone)]
pub struct MockExecutor {
    calls: Arc<Mutex<Vec<Mutation>>>,
    script: Arc<Mutex<VecDeque<ExecuteResult<()>>>>,
    fallback: Arc<Mutex<ExecuteResult<()>>>,
    gate: Option<Arc<Semaphore>>,
    started: Arc<Notify>,
}

impl MockExecutor {
    /// An executor where every call succeeds.
    pub fn new() -> Self {
        MockExecutor {
            calls: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(Ok(()))),
            gate: None,
            started: Arc::new(Notify::new()),
        }
    }

    /// An executor where every call fails with `err`.
    pub fn failing(err: ExecuteError) -> Self {
        let executor = Self::new();
        executor.set_fallback(Err(err));
        executor
    }

    /// An executor whose calls block until permits are added to the returned semaphore.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let executor = MockExecutor {
            gate: Some(Arc::clone(&gate)),
            ..Self::new()
        };
        (executor, gate)
    }

    /// Queue a result for the next unscripted call.
    pub fn push_result(&self, result: ExecuteResult<()>) {
        self.script.lock().unwrap().push_back(result);
    }

    /// Result for calls once the script is exhausted.
    pub fn set_fallback(&self, result: ExecuteResult<()>) {
        *self.fallback.lock().unwrap() = result;
    }

    /// All mutations passed to `execute`, in call order.
    pub fn calls(&self) -> Vec<Mutation> {
        self.calls.lock().unwrap().clone()
    }

    /// Ids of all executed mutations, in call order.
    pub fn call_ids(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|m| m.id.as_str().to_string())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Waits until a call has entered `execute`.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }
}

impl RemoteMutationExecutor for MockExecutor {
    fn execute<'a>(&'a self, mutation: &'a Mutation) -> ExecuteFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(mutation.clone());
            self.started.notify_one();

            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }

            let scripted = self.script.lock().unwrap().pop_front();
            scripted.unwrap_or_else(|| self.fallback.lock().unwrap().clone())
        })
    }
}
