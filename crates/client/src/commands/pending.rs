// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use offsync_core::PendingMutation;

use super::open_manager;
use crate::config::Config;
use crate::error::Result;

pub async fn run(config: &Config) -> Result<()> {
    let manager = open_manager(config, false).await;
    let pending = manager.pending().await;

    if pending.is_empty() {
        println!("no pending mutations");
        return Ok(());
    }
    for entry in &pending {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

/// One line per entry: `<id> <action> <collection>[/<document>] retries=<n>`.
pub fn format_entry(entry: &PendingMutation) -> String {
    let mutation = &entry.mutation;
    let target = match mutation.document() {
        Some(doc) => format!("{}/{}", mutation.collection, doc),
        None => mutation.collection.clone(),
    };
    format!(
        "{} {} {} retries={}",
        mutation.id, mutation.action, target, entry.retry_count
    )
}
