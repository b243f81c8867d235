// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket server implementation.
//!
//! Each text frame carries one client message and gets exactly one reply:
//! `ack`/`rejected` for `apply`, `pong` for `ping`, `error` otherwise.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use offsync_core::protocol::{ClientMessage, ServerMessage};

use crate::state::ServerState;
use crate::store::ApplyOutcome;

/// Run the WebSocket server on the given address.
pub async fn run(addr: SocketAddr, state: ServerState) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on: {}", addr);

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: ServerState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    info!("New WebSocket connection from: {}", peer_addr);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let response = handle_client_message(&text, &state).await;
                let json = response.to_json()?;
                ws_sink.send(Message::Text(json.into())).await?;
            }
            Ok(Message::Close(_)) => {
                info!("Client {} disconnected", peer_addr);
                break;
            }
            Ok(Message::Ping(data)) => {
                ws_sink.send(Message::Pong(data)).await?;
            }
            Ok(_) => {
                // Binary, Pong and raw frames carry nothing for us
            }
            Err(e) => {
                warn!("WebSocket error from {}: {}", peer_addr, e);
                break;
            }
        }
    }

    info!("Connection closed: {}", peer_addr);
    Ok(())
}

/// Process a client message and return the reply.
pub(crate) async fn handle_client_message(text: &str, state: &ServerState) -> ServerMessage {
    let msg = match ClientMessage::from_json(text) {
        Ok(msg) => msg,
        Err(e) => return ServerMessage::error(format!("invalid message: {}", e)),
    };
    debug!("Received message: {:?}", msg);

    match msg {
        ClientMessage::Apply(mutation) => match state.apply(&mutation).await {
            Ok(ApplyOutcome::Applied) => {
                debug!(id = %mutation.id, action = %mutation.action, "mutation applied");
                ServerMessage::ack(mutation.id)
            }
            Ok(ApplyOutcome::Duplicate) => {
                debug!(id = %mutation.id, "duplicate mutation, acknowledging");
                ServerMessage::ack(mutation.id)
            }
            Ok(ApplyOutcome::Rejected(reason)) => {
                info!(id = %mutation.id, reason = %reason, "mutation rejected");
                ServerMessage::rejected(mutation.id, reason)
            }
            Err(e) => {
                error!(id = %mutation.id, error = %e, "failed to apply mutation");
                ServerMessage::error(e.to_string())
            }
        },
        ClientMessage::Ping { id } => {
            debug!("Ping received: {}", id);
            ServerMessage::pong(id)
        }
    }
}
