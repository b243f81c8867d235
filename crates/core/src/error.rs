// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for offsync-core operations.

use thiserror::Error;

/// All possible errors that can occur in offsync-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid mutation: {0}")]
    InvalidMutation(String),

    #[error("invalid action: '{0}'\n  hint: valid actions are: create, update, delete")]
    InvalidAction(String),

    #[error("invalid status: '{0}'\n  hint: valid statuses are: pending, failed")]
    InvalidStatus(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for offsync-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
