// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Wraps the document store for shared access across connections.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use offsync_core::Mutation;
use serde_json::Value;

use crate::error::Result;
use crate::store::{ApplyOutcome, DocumentStore};

const DB_FILE_NAME: &str = "documents.db";

/// Shared server state containing the document store.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    /// Serializes all writes; mutations apply one at a time.
    store: Mutex<DocumentStore>,
}

impl ServerState {
    /// Opens the document store in the given directory.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let store = DocumentStore::open(&data_dir.join(DB_FILE_NAME))?;
        Ok(ServerState {
            inner: Arc::new(ServerStateInner {
                store: Mutex::new(store),
            }),
        })
    }

    pub async fn apply(&self, mutation: &Mutation) -> Result<ApplyOutcome> {
        self.inner.store.lock().await.apply(mutation)
    }

    pub async fn document(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        self.inner.store.lock().await.get(collection, id)
    }

    pub async fn count(&self, collection: &str) -> Result<usize> {
        self.inner.store.lock().await.count(collection)
    }
}
