// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use offsync_core::MutationAction;
use serde_json::Value;

use super::open_manager;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::sync::EnqueueOutcome;

pub async fn run(
    config: &Config,
    collection: &str,
    action: MutationAction,
    document_id: Option<String>,
    data: Option<String>,
    offline: bool,
) -> Result<()> {
    let outcome = enqueue(config, collection, action, document_id, data, offline).await?;
    println!("{}", format_outcome(&outcome));
    Ok(())
}

/// Applies or queues a single mutation.
pub async fn enqueue(
    config: &Config,
    collection: &str,
    action: MutationAction,
    document_id: Option<String>,
    data: Option<String>,
    offline: bool,
) -> Result<EnqueueOutcome> {
    let data = data.as_deref().map(parse_data).transpose()?;
    let manager = open_manager(config, !offline).await;
    let outcome = manager
        .enqueue(collection, document_id.as_deref(), action, data)
        .await?;
    manager.executor().disconnect().await;
    Ok(outcome)
}

/// Parses the `--data` argument as a JSON value.
pub fn parse_data(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|e| Error::InvalidData(e.to_string()))
}

pub fn format_outcome(outcome: &EnqueueOutcome) -> String {
    match outcome {
        EnqueueOutcome::Executed(id) => format!("executed {}", id),
        EnqueueOutcome::Queued(id) => format!("queued {}", id),
    }
}
