// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod drain;
pub mod enqueue;
pub mod pending;
pub mod run;

use tracing::debug;

use crate::cli::Command;
use crate::config::Config;
use crate::error::Result;
use crate::sync::{ConnectivityMonitor, JsonlQueueStore, SyncQueueManager, WebSocketExecutor};

/// Manager wired to the bundled WebSocket executor and JSONL store.
pub type Manager = SyncQueueManager<WebSocketExecutor, JsonlQueueStore>;

/// Builds the manager from configuration.
///
/// With `probe`, a connection attempt seeds the monitor with the actual
/// connectivity state; otherwise the manager starts offline.
pub async fn open_manager(config: &Config, probe: bool) -> Manager {
    let monitor = ConnectivityMonitor::new(false);
    let executor =
        WebSocketExecutor::new(config.transport_config()).with_monitor(monitor.clone());
    if probe {
        if let Err(e) = executor.connect().await {
            debug!(url = %config.remote.url, error = %e, "remote store unreachable");
        }
    }
    let store = JsonlQueueStore::new(config.queue_path.clone());
    SyncQueueManager::new(config.sync_config(), executor, store, monitor)
}

/// Runs a parsed subcommand.
pub async fn dispatch(config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Enqueue {
            collection,
            action,
            document_id,
            data,
            offline,
        } => enqueue::run(config, &collection, action, document_id, data, offline).await,
        Command::Pending => pending::run(config).await,
        Command::Drain => drain::run(config).await,
        Command::Run => run::run(config).await,
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
