// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! offsync - offline-tolerant mutation queue for a remote document store.
//!
//! Writes are applied immediately while the remote store is reachable and
//! queued durably otherwise. Queued writes are replayed in insertion order
//! on a fixed interval and on every offline → online transition, with a
//! bounded number of retries per write.
//!
//! # Main Components
//!
//! - [`sync::SyncQueueManager`] - enqueue, drain and the background triggers
//! - [`sync::ConnectivityMonitor`] - online/offline state and transitions
//! - [`sync::SyncQueueStore`] - durable queue storage (JSONL file, in-memory)
//! - [`sync::RemoteMutationExecutor`] - applies one mutation remotely
//! - [`Config`] - TOML configuration
//!
//! # Embedding
//!
//! ```rust,ignore
//! use offsync::sync::{ConnectivityMonitor, JsonlQueueStore, SyncConfig, SyncQueueManager};
//!
//! let monitor = ConnectivityMonitor::new(false);
//! let manager = SyncQueueManager::new(
//!     SyncConfig::default(),
//!     my_executor,
//!     JsonlQueueStore::new("queue.jsonl"),
//!     monitor.clone(),
//! );
//! let handle = manager.start();
//! manager.enqueue("orders", Some("ord-1"), MutationAction::Delete, None).await?;
//! // platform adapter
//! monitor.set_online(true);
//! handle.dispose().await;
//! ```

mod cli;
mod commands;
mod env;

pub mod config;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{Error, Result};

/// Runs a parsed command line to completion.
///
/// Commands run on a single-threaded tokio runtime.
pub fn run(cli: Cli) -> Result<()> {
    let config = Config::discover(cli.config.as_deref())?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(commands::dispatch(&config, cli.command))
}
