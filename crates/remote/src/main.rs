// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! offsync-remote: development document store for the offsync client.
//!
//! Applies mutations received over WebSocket to a SQLite-backed document
//! store, deduplicating replays by mutation id.

mod error;
mod server;
mod state;
mod store;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// offsync-remote: development document store
#[derive(Parser, Debug)]
#[command(name = "offsync-remote")]
#[command(about = "WebSocket document store for developing against the offsync client")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1:7890")]
    bind: SocketAddr,

    /// Directory for the document database
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting offsync-remote server");
    info!("  Bind address: {}", args.bind);
    info!("  Data directory: {}", args.data.display());

    let state = state::ServerState::new(&args.data)?;
    server::run(args.bind, state).await?;

    Ok(())
}
