// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::open_manager;
use crate::config::Config;
use crate::error::Result;
use crate::sync::{DrainOutcome, DropReason, DroppedMutation};

pub async fn run(config: &Config) -> Result<()> {
    let manager = open_manager(config, true).await;

    let outcome = manager.drain().await;
    if let DrainOutcome::Completed(report) = &outcome {
        for dropped in &report.dropped {
            println!("{}", format_dropped(dropped));
        }
    }

    let remaining = manager.pending().await.len();
    println!("{}", format_outcome(&outcome, &config.remote.url, remaining));
    manager.executor().disconnect().await;
    Ok(())
}

pub fn format_reason(reason: &DropReason) -> String {
    match reason {
        DropReason::RetriesExhausted => "retries exhausted".to_string(),
        DropReason::Rejected(message) => format!("rejected ({})", message),
    }
}

pub fn format_dropped(dropped: &DroppedMutation) -> String {
    format!(
        "dropped {}: {}",
        dropped.mutation.id(),
        format_reason(&dropped.reason)
    )
}

pub fn format_outcome(outcome: &DrainOutcome, url: &str, remaining: usize) -> String {
    match outcome {
        DrainOutcome::Completed(report) if report.attempted == 0 => {
            "no pending mutations".to_string()
        }
        DrainOutcome::Completed(report) => format!(
            "applied {}, retried {}, dropped {}, remaining {}",
            report.applied,
            report.retried,
            report.dropped.len(),
            report.remaining
        ),
        DrainOutcome::AlreadyRunning => "drain already in progress".to_string(),
        DrainOutcome::Offline => format!("offline: {} unreachable, {} pending", url, remaining),
    }
}
