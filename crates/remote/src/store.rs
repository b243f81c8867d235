// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite document store.
//!
//! Documents are JSON values keyed by `(collection, id)`. Every applied
//! mutation id is recorded, so a replayed mutation is acknowledged without
//! being applied a second time.

use chrono::Utc;
use offsync_core::{Mutation, MutationAction};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde_json::Value;
use std::path::Path;

use crate::error::Result;

/// SQL schema for the document store.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);

-- Idempotency keys of applied mutations
CREATE TABLE IF NOT EXISTS applied_mutations (
    id TEXT PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Result of applying a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The mutation id was applied before; nothing changed.
    Duplicate,
    /// The mutation cannot be applied to the current state.
    Rejected(String),
}

pub struct DocumentStore {
    conn: Connection,
}

impl DocumentStore {
    /// Open or create the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(DocumentStore { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(DocumentStore { conn })
    }

    /// Applies `mutation` atomically.
    ///
    /// - `create` stores a new document, using the mutation id when no
    ///   document id is given; an existing document is a rejection
    /// - `update` merges object payloads key by key into an existing document
    ///   and replaces anything else; a missing document is a rejection
    /// - `delete` removes the document if present
    pub fn apply(&mut self, mutation: &Mutation) -> Result<ApplyOutcome> {
        if let Some(reason) = invalid_reason(mutation) {
            return Ok(ApplyOutcome::Rejected(reason));
        }

        let tx = self.conn.transaction()?;
        if is_applied(&tx, mutation.id.as_str())? {
            return Ok(ApplyOutcome::Duplicate);
        }

        let collection = mutation.collection.as_str();
        let doc_id = mutation.document().unwrap_or(mutation.id.as_str());
        let now = Utc::now().to_rfc3339();

        match mutation.action {
            MutationAction::Create => {
                if load(&tx, collection, doc_id)?.is_some() {
                    return Ok(ApplyOutcome::Rejected(format!(
                        "document {}/{} already exists",
                        collection, doc_id
                    )));
                }
                tx.execute(
                    "INSERT INTO documents (collection, id, data, updated_at) VALUES (?1, ?2, ?3, ?4)",
                    params![collection, doc_id, serde_json::to_string(&mutation.data)?, now],
                )?;
            }
            MutationAction::Update => {
                let Some(mut current) = load(&tx, collection, doc_id)? else {
                    return Ok(ApplyOutcome::Rejected(format!(
                        "document {}/{} not found",
                        collection, doc_id
                    )));
                };
                merge(&mut current, &mutation.data);
                tx.execute(
                    "UPDATE documents SET data = ?3, updated_at = ?4 WHERE collection = ?1 AND id = ?2",
                    params![collection, doc_id, serde_json::to_string(&current)?, now],
                )?;
            }
            MutationAction::Delete => {
                tx.execute(
                    "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, doc_id],
                )?;
            }
        }

        tx.execute(
            "INSERT INTO applied_mutations (id, applied_at) VALUES (?1, ?2)",
            params![mutation.id.as_str(), now],
        )?;
        tx.commit()?;
        Ok(ApplyOutcome::Applied)
    }

    /// Returns a document, if present.
    pub fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(data.map(|d| serde_json::from_str(&d)).transpose()?)
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn invalid_reason(mutation: &Mutation) -> Option<String> {
    if mutation.collection.trim().is_empty() {
        return Some("collection is required".to_string());
    }
    if mutation.action.requires_document() && mutation.document().is_none() {
        return Some(format!("document id is required for {}", mutation.action));
    }
    if mutation.action.requires_data() && mutation.data.is_null() {
        return Some(format!("data is required for {}", mutation.action));
    }
    None
}

fn is_applied(tx: &Transaction<'_>, id: &str) -> Result<bool> {
    let found = tx
        .query_row(
            "SELECT 1 FROM applied_mutations WHERE id = ?1",
            params![id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn load(tx: &Transaction<'_>, collection: &str, id: &str) -> Result<Option<Value>> {
    let data: Option<String> = tx
        .query_row(
            "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(data.map(|d| serde_json::from_str(&d)).transpose()?)
}

/// Shallow merge for objects, replacement otherwise.
fn merge(current: &mut Value, patch: &Value) {
    match (current, patch) {
        (Value::Object(current), Value::Object(patch)) => {
            for (key, value) in patch {
                current.insert(key.clone(), value.clone());
            }
        }
        (current, patch) => *current = patch.clone(),
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
