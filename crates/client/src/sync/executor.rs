// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Executor abstraction for applying mutations to the remote store.
//!
//! The surrounding application supplies an adapter over its remote data
//! store client. [`WebSocketExecutor`](super::WebSocketExecutor) is the
//! bundled adapter; tests use scripted mocks.

use std::future::Future;
use std::pin::Pin;

use offsync_core::Mutation;

/// Error type for executor operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecuteError {
    /// Network failure, timeout or server-side error. Worth retrying.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The remote store refused the mutation. Retrying will not help.
    #[error("rejected by remote store: {0}")]
    Rejected(String),
}

impl ExecuteError {
    /// Whether a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecuteError::Transient(_))
    }
}

/// Result type for executor operations.
pub type ExecuteResult<T> = Result<T, ExecuteError>;

/// Boxed future returned by [`RemoteMutationExecutor::execute`].
pub type ExecuteFuture<'a> = Pin<Box<dyn Future<Output = ExecuteResult<()>> + Send + 'a>>;

/// Applies one mutation to the remote store.
///
/// The mutation id is sent along as an idempotency key. Timeouts are the
/// implementation's responsibility.
pub trait RemoteMutationExecutor: Send + Sync {
    fn execute<'a>(&'a self, mutation: &'a Mutation) -> ExecuteFuture<'a>;
}
