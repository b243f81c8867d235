// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline mutation sync queue.
//!
//! Keeps writes made while disconnected from the remote document store and
//! replays them once connectivity returns.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Manager    │────►│   Executor   │────►│    Remote    │
//! │ (SyncQueue-  │     │   (trait)    │◄────│    Store     │
//! │   Manager)   │     └──────────────┘     └──────────────┘
//! └──────────────┘
//!     │      ▲
//!     ▼      │ online transitions
//! ┌────────┐ ┌──────────────┐
//! │ Store  │ │ Connectivity │
//! │(JSONL) │ │   Monitor    │
//! └────────┘ └──────────────┘
//! ```
//!
//! # Features
//!
//! - Immediate execution while online, durable queuing otherwise
//! - Drains on a fixed interval and on every offline → online transition
//! - Single-flight drains; at most 5 retries before a mutation is dropped
//! - Drop notifications through a broadcast event channel
//! - Injectable executor and store traits for testing

mod connectivity;
mod executor;
mod manager;
mod store;
mod transport;

pub use connectivity::{ConnectivityEvents, ConnectivityMonitor};
pub use executor::{ExecuteError, ExecuteFuture, ExecuteResult, RemoteMutationExecutor};
pub use manager::{
    DrainOutcome, DrainReport, DropReason, DroppedMutation, EnqueueOutcome, SyncConfig, SyncError,
    SyncEvent, SyncHandle, SyncQueueManager, SyncResult, MIN_DRAIN_INTERVAL,
};
pub use store::{JsonlQueueStore, MemoryQueueStore, StoreError, StoreResult, SyncQueueStore};
pub use transport::{TransportConfig, WebSocketExecutor};

#[cfg(test)]
mod test_helpers;





#[cfg(test)]
mod transport_tests;
