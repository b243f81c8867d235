// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Long-running sync loop.
//!
//! Starts the manager's timer and reconnect listener, keeps trying to reach
//! the remote store while offline, and shuts down cleanly on Ctrl-C.

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::{open_manager, Manager};
use crate::config::Config;
use crate::error::Result;
use crate::sync::SyncEvent;

/// Pause between reconnect rounds once backoff gives up.
const RECONNECT_PAUSE: Duration = Duration::from_secs(5);

pub async fn run(config: &Config) -> Result<()> {
    let manager = open_manager(config, true).await;
    info!(
        url = %config.remote.url,
        queue = %config.queue_path.display(),
        pending = manager.pending().await.len(),
        "offsync running, press Ctrl-C to stop"
    );

    let handle = manager.start();
    let reconnect = tokio::spawn(reconnect_loop(manager.clone()));
    let reporter = tokio::spawn(report_events(manager.clone()));

    // Drain whatever survived the last run without waiting for the timer.
    manager.drain().await;

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    reconnect.abort();
    reporter.abort();
    handle.dispose().await;
    manager.executor().disconnect().await;
    Ok(())
}

async fn reconnect_loop(manager: Manager) {
    loop {
        if !manager.monitor().is_online() {
            if let Err(e) = manager.executor().reconnect_with_backoff().await {
                warn!(error = %e, "remote store still unreachable");
            }
        }
        tokio::time::sleep(RECONNECT_PAUSE).await;
    }
}

async fn report_events(manager: Manager) {
    let mut events = manager.subscribe();
    loop {
        match events.recv().await {
            Ok(SyncEvent::Dropped { mutation, reason }) => {
                warn!(id = %mutation.id(), ?reason, "mutation dropped");
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "event reporter lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
