// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! offsync-core: Shared library for the offline mutation sync queue
//!
//! This crate provides the mutation data model, the WebSocket wire protocol,
//! and the JSONL persistence helpers used by both the `offsync` client and
//! the `offsync-remote` development server.

pub mod error;
pub mod jsonl;
pub mod mutation;
pub mod protocol;

pub use error::{Error, Result};
pub use mutation::{Mutation, MutationAction, MutationId, MutationStatus, PendingMutation};
