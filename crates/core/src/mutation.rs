// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Mutations queued for application to the remote document store.
//!
//! A [`Mutation`] is the executable part of a write: which collection and
//! document it targets, what to do, and the payload. A [`PendingMutation`]
//! wraps a mutation with the bookkeeping the offline queue needs (retry
//! count, status, enqueue time) and is the persisted record format:
//!
//! ```text
//! {"id":"m-1a2b3c4d5e6f","collection":"orders","documentId":"A","action":"update",
//!  "data":{"x":1},"retryCount":0,"status":"pending","timestamp":"2026-01-01T00:00:00Z"}
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a mutation.
///
/// Also used by the remote store as an idempotency key, so a replayed
/// mutation is acknowledged without being applied twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationId(String);

impl MutationId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        MutationId(id.into())
    }

    /// Generate an ID from the mutation target and creation time.
    /// Format: `m-{hash}` where hash is the first 12 hex chars of
    /// SHA256(collection + document + action + timestamp + sequence).
    pub fn generate(
        collection: &str,
        document_id: &str,
        action: MutationAction,
        created_at: &DateTime<Utc>,
    ) -> Self {
        let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let input = format!(
            "{}/{}/{}/{}/{}",
            collection,
            document_id,
            action,
            created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            seq
        );
        let hash = Sha256::digest(input.as_bytes());
        MutationId(format!("m-{}", hex::encode(&hash[..6])))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kind of write a mutation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationAction {
    Create,
    Update,
    Delete,
}

impl MutationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationAction::Create => "create",
            MutationAction::Update => "update",
            MutationAction::Delete => "delete",
        }
    }

    /// Whether the action needs a target document id.
    pub fn requires_document(&self) -> bool {
        !matches!(self, MutationAction::Create)
    }

    /// Whether the action carries a payload.
    pub fn requires_data(&self) -> bool {
        !matches!(self, MutationAction::Delete)
    }
}

impl fmt::Display for MutationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MutationAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "create" => Ok(MutationAction::Create),
            "update" => Ok(MutationAction::Update),
            "delete" => Ok(MutationAction::Delete),
            _ => Err(Error::InvalidAction(s.to_string())),
        }
    }
}

/// Queue status of a pending mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationStatus {
    /// Waiting for the next drain pass.
    #[default]
    Pending,
    /// Terminal. Retries exhausted or rejected by the remote store.
    Failed,
}

impl MutationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationStatus::Pending => "pending",
            MutationStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for MutationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MutationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(MutationStatus::Pending),
            "failed" => Ok(MutationStatus::Failed),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// A single write against a remote collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mutation {
    pub id: MutationId,
    pub collection: String,
    /// Target document. Empty for a `create` that lets the store pick the id.
    #[serde(default)]
    pub document_id: String,
    pub action: MutationAction,
    /// Opaque payload. `null` for `delete`.
    #[serde(default)]
    pub data: Value,
}

impl Mutation {
    /// Creates a validated mutation with a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMutation`] if the collection is empty, an
    /// `update`/`delete` has no document id, or a `create`/`update` has no
    /// payload.
    pub fn new(
        collection: impl Into<String>,
        document_id: Option<String>,
        action: MutationAction,
        data: Option<Value>,
        created_at: &DateTime<Utc>,
    ) -> Result<Self> {
        let collection = collection.into();
        let document_id = document_id.unwrap_or_default();
        let id = MutationId::generate(&collection, &document_id, action, created_at);
        Mutation {
            id,
            collection,
            document_id,
            action,
            data: data.unwrap_or(Value::Null),
        }
        .validate()
    }

    /// Replaces the generated id.
    pub fn with_id(mut self, id: MutationId) -> Self {
        self.id = id;
        self
    }

    /// Returns the target document id, if any.
    pub fn document(&self) -> Option<&str> {
        if self.document_id.is_empty() {
            None
        } else {
            Some(&self.document_id)
        }
    }

    fn validate(mut self) -> Result<Self> {
        if self.collection.trim().is_empty() {
            return Err(Error::InvalidMutation("collection is required".into()));
        }
        if self.action.requires_document() && self.document_id.trim().is_empty() {
            return Err(Error::InvalidMutation(format!(
                "document id is required for {}",
                self.action
            )));
        }
        if self.action.requires_data() {
            if self.data.is_null() {
                return Err(Error::InvalidMutation(format!(
                    "data is required for {}",
                    self.action
                )));
            }
        } else {
            self.data = Value::Null;
        }
        Ok(self)
    }
}

/// A mutation waiting in the offline queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMutation {
    #[serde(flatten)]
    pub mutation: Mutation,
    /// Failed drain attempts so far.
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub status: MutationStatus,
    /// When the mutation was first queued.
    pub timestamp: DateTime<Utc>,
}

impl PendingMutation {
    /// Wraps a mutation as a fresh queue entry.
    pub fn new(mutation: Mutation, enqueued_at: DateTime<Utc>) -> Self {
        PendingMutation {
            mutation,
            retry_count: 0,
            status: MutationStatus::Pending,
            timestamp: enqueued_at,
        }
    }

    pub fn id(&self) -> &MutationId {
        &self.mutation.id
    }

    pub fn is_failed(&self) -> bool {
        self.status == MutationStatus::Failed
    }

    /// Records a failed attempt.
    ///
    /// Marks the entry failed once `retry_count` exceeds `max_retries` and
    /// returns true in that case.
    pub fn record_failure(&mut self, max_retries: u32) -> bool {
        self.retry_count = self.retry_count.saturating_add(1);
        if self.retry_count > max_retries {
            self.status = MutationStatus::Failed;
        }
        self.is_failed()
    }

    /// Marks the entry failed without touching the retry count.
    pub fn mark_failed(&mut self) {
        self.status = MutationStatus::Failed;
    }
}

#[cfg(test)]
#[path = "mutation_tests.rs"]
mod tests;
