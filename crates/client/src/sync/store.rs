// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable storage for the pending-mutation queue.
//!
//! The file store uses JSONL: one [`PendingMutation`] per line, in FIFO
//! order. Saves replace the whole file through a temp file and rename, so a
//! restart always observes the last completed save.
//!
//! Only one process may own a queue file. Concurrent writers from several
//! processes are not coordinated and the last save wins.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use offsync_core::{jsonl, PendingMutation};
use tracing::{debug, warn};

/// Error type for queue storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other storage failure.
    #[error("storage error: {0}")]
    Other(String),
}

impl From<offsync_core::Error> for StoreError {
    fn from(err: offsync_core::Error) -> Self {
        match err {
            offsync_core::Error::Io(e) => StoreError::Io(e),
            offsync_core::Error::Json(e) => StoreError::Serialization(e),
            other => StoreError::Other(other.to_string()),
        }
    }
}

/// Result type for queue storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for the ordered pending-mutation queue.
pub trait SyncQueueStore: Send + Sync {
    /// Returns the persisted queue.
    ///
    /// Missing, unreadable or corrupt storage yields an empty queue.
    fn load(&self) -> Vec<PendingMutation>;

    /// Replaces the persisted queue with `queue`.
    fn save(&self, queue: &[PendingMutation]) -> StoreResult<()>;
}

/// JSONL file-backed queue store.
#[derive(Debug, Clone)]
pub struct JsonlQueueStore {
    /// Path to the queue file.
    path: PathBuf,
}

impl JsonlQueueStore {
    /// Creates a store for the given path. The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonlQueueStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SyncQueueStore for JsonlQueueStore {
    fn load(&self) -> Vec<PendingMutation> {
        match jsonl::read_all(&self.path) {
            Ok(queue) => queue,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "sync queue unreadable, starting with an empty queue"
                );
                Vec::new()
            }
        }
    }

    fn save(&self, queue: &[PendingMutation]) -> StoreResult<()> {
        jsonl::write_all(&self.path, queue)?;
        debug!(path = %self.path.display(), entries = queue.len(), "sync queue saved");
        Ok(())
    }
}

/// In-memory queue store for tests and embedders without durable storage.
#[derive(Debug, Default)]
pub struct MemoryQueueStore {
    entries: Mutex<Vec<PendingMutation>>,
    saves: Mutex<usize>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `queue`, as if restored after a restart.
    pub fn with_entries(queue: Vec<PendingMutation>) -> Self {
        MemoryQueueStore {
            entries: Mutex::new(queue),
            saves: Mutex::new(0),
        }
    }

    /// Number of completed saves.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SyncQueueStore for MemoryQueueStore {
    fn load(&self) -> Vec<PendingMutation> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn save(&self, queue: &[PendingMutation]) -> StoreResult<()> {
        *self.entries.lock().unwrap_or_else(|e| e.into_inner()) = queue.to_vec();
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}
