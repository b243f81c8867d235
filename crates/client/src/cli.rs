// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use offsync_core::MutationAction;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn parse_action(s: &str) -> Result<MutationAction, String> {
    s.parse()
        .map_err(|_| "expected one of: create, update, delete".to_string())
}

#[derive(Parser)]
#[command(name = "offsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-tolerant mutation queue for a remote document store")]
#[command(
    long_about = "Offline-tolerant mutation queue for a remote document store.\n\n\
    Writes are applied immediately while the remote store is reachable and queued \
    durably otherwise. Queued writes are replayed periodically and whenever \
    connectivity returns."
)]
pub struct Cli {
    /// Config file (default: $OFFSYNC_CONFIG or <config dir>/offsync/config.toml)
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply a mutation now, or queue it if the remote store is unreachable
    #[command(after_help = "\
Examples:
  offsync enqueue orders create --data '{\"total\":3}'
  offsync enqueue orders update -d ord-1 --data '{\"status\":\"paid\"}'
  offsync enqueue orders delete -d ord-1 --offline")]
    Enqueue {
        /// Target collection
        #[arg(value_parser = non_empty_string)]
        collection: String,

        /// Mutation kind (create, update, delete)
        #[arg(value_parser = parse_action)]
        action: MutationAction,

        /// Target document (required for update and delete)
        #[arg(long, short = 'd', value_name = "ID")]
        document_id: Option<String>,

        /// JSON payload (required for create and update)
        #[arg(long, value_name = "JSON")]
        data: Option<String>,

        /// Skip the connection attempt and queue directly
        #[arg(long)]
        offline: bool,
    },

    /// List queued mutations in replay order
    Pending,

    /// Connect and replay the queue once
    Drain,

    /// Keep syncing until interrupted
    Run,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
