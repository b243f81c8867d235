// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Online/offline state tracking.
//!
//! The monitor does not poll. A platform adapter (the WebSocket executor in
//! native builds) reports transitions through [`ConnectivityMonitor::set_online`];
//! if it never reports, the state goes stale.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

/// Single source of truth for connectivity.
///
/// Cloning yields another handle to the same state.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    /// Creates a monitor seeded with the platform-reported state.
    pub fn new(initially_online: bool) -> Self {
        let (tx, _) = watch::channel(initially_online);
        ConnectivityMonitor { tx: Arc::new(tx) }
    }

    /// Returns the current connectivity state.
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Records a platform connectivity report.
    ///
    /// Returns true if the state changed. Repeated reports of the current
    /// state are ignored and do not wake subscribers.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|state| {
            if *state == online {
                false
            } else {
                *state = online;
                true
            }
        });

        if changed {
            if online {
                info!("connectivity: online");
            } else {
                warn!("connectivity: offline");
            }
        }
        changed
    }

    /// Subscribes to transitions. The current state counts as already seen.
    pub fn subscribe(&self) -> ConnectivityEvents {
        ConnectivityEvents {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiver side of a [`ConnectivityMonitor`].
#[derive(Debug)]
pub struct ConnectivityEvents {
    rx: watch::Receiver<bool>,
}

impl ConnectivityEvents {
    /// Waits for the next offline → online transition.
    ///
    /// Offline transitions are consumed silently. Returns `None` once every
    /// monitor handle has been dropped.
    pub async fn next_online(&mut self) -> Option<()> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            if *self.rx.borrow_and_update() {
                return Some(());
            }
        }
    }
}
