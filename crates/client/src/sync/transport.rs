// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket executor for the `offsync-remote` document store.
//!
//! Sends one `apply` frame per mutation and waits for the `ack` or
//! `rejected` frame carrying the same id. The connection is opened lazily
//! and dropped on any socket failure; the next call reconnects. Connect
//! outcomes are reported to an optional [`ConnectivityMonitor`], which makes
//! this executor the platform connectivity adapter for native builds.

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use offsync_core::protocol::{ClientMessage, ServerMessage};
use offsync_core::Mutation;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use super::connectivity::ConnectivityMonitor;
use super::executor::{ExecuteError, ExecuteFuture, ExecuteResult, RemoteMutationExecutor};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection settings for [`WebSocketExecutor`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// URL of the remote server.
    pub url: String,
    /// Upper bound for connecting and for each request/response round trip.
    pub request_timeout: Duration,
    /// Maximum reconnection attempts.
    pub max_retries: u32,
    /// Initial delay for exponential backoff (milliseconds).
    pub initial_delay_ms: u64,
    /// Maximum delay between reconnection attempts (seconds).
    pub max_delay_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            url: "ws://localhost:7890".to_string(),
            request_timeout: Duration::from_secs(10),
            max_retries: 10,
            initial_delay_ms: 100,
            max_delay_secs: 30,
        }
    }
}

struct WebSocketConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

/// How a single apply round trip failed.
#[derive(Debug)]
enum ApplyError {
    /// The store refused the mutation.
    Rejected(String),
    /// The server answered with an error frame; the socket is still usable.
    Server(String),
    /// The socket is broken or timed out and must be reopened.
    Connection(String),
}

impl From<ApplyError> for ExecuteError {
    fn from(err: ApplyError) -> Self {
        match err {
            ApplyError::Rejected(message) => ExecuteError::Rejected(message),
            ApplyError::Server(message) => {
                ExecuteError::Transient(format!("server error: {message}"))
            }
            ApplyError::Connection(message) => ExecuteError::Transient(message),
        }
    }
}

/// [`RemoteMutationExecutor`] over a single WebSocket connection.
///
/// Calls are serialized on the connection; the protocol has one request in
/// flight at a time.
pub struct WebSocketExecutor {
    config: TransportConfig,
    connection: Mutex<Option<WebSocketConnection>>,
    monitor: Option<ConnectivityMonitor>,
}

impl WebSocketExecutor {
    pub fn new(config: TransportConfig) -> Self {
        WebSocketExecutor {
            config,
            connection: Mutex::new(None),
            monitor: None,
        }
    }

    /// Reports connect successes and socket failures to `monitor`.
    pub fn with_monitor(mut self, monitor: ConnectivityMonitor) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Check if a connection is currently open.
    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    /// Open the connection if it is not already open.
    ///
    /// # Errors
    ///
    /// Returns [`ExecuteError::Transient`] if the server cannot be reached
    /// within the request timeout.
    pub async fn connect(&self) -> ExecuteResult<()> {
        let mut slot = self.connection.lock().await;
        if slot.is_none() {
            *slot = Some(self.open().await?);
        }
        Ok(())
    }

    /// Close the connection, if open.
    pub async fn disconnect(&self) {
        if let Some(mut conn) = self.connection.lock().await.take() {
            let _ = conn.sink.close().await;
        }
    }

    /// Connect with exponential backoff retry.
    ///
    /// The delay starts at `initial_delay_ms`, doubles after every failed
    /// attempt and is capped at `max_delay_secs`.
    ///
    /// # Errors
    ///
    /// Returns the last connect error once `max_retries` attempts failed.
    pub async fn reconnect_with_backoff(&self) -> ExecuteResult<()> {
        let mut attempt = 0;
        let mut delay_ms = self.config.initial_delay_ms;

        loop {
            attempt += 1;
            match self.connect().await {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= self.config.max_retries => {
                    warn!(attempts = attempt, error = %e, "giving up on reconnect");
                    return Err(e);
                }
                Err(e) => {
                    debug!(attempt, delay_ms, error = %e, "reconnect failed, backing off");
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    delay_ms = std::cmp::min(delay_ms * 2, self.config.max_delay_secs * 1000);
                }
            }
        }
    }

    async fn open(&self) -> ExecuteResult<WebSocketConnection> {
        let connect = tokio_tungstenite::connect_async(self.config.url.as_str());
        let result = match tokio::time::timeout(self.config.request_timeout, connect).await {
            Ok(Ok((ws, _))) => Ok(ws),
            Ok(Err(e)) => Err(ExecuteError::Transient(format!("connection failed: {e}"))),
            Err(_) => Err(ExecuteError::Transient("connection timed out".into())),
        };

        match result {
            Ok(ws) => {
                debug!(url = %self.config.url, "connected to remote store");
                self.report(true);
                let (sink, stream) = ws.split();
                Ok(WebSocketConnection { sink, stream })
            }
            Err(e) => {
                self.report(false);
                Err(e)
            }
        }
    }

    fn report(&self, online: bool) {
        if let Some(monitor) = &self.monitor {
            monitor.set_online(online);
        }
    }

    async fn apply(&self, mutation: &Mutation) -> ExecuteResult<()> {
        let mut slot = self.connection.lock().await;
        if slot.is_none() {
            *slot = Some(self.open().await?);
        }
        let Some(conn) = slot.as_mut() else {
            return Err(ExecuteError::Transient("not connected".into()));
        };

        let round_trip = round_trip(conn, mutation);
        let result = match tokio::time::timeout(self.config.request_timeout, round_trip).await {
            Ok(result) => result,
            Err(_) => Err(ApplyError::Connection("request timed out".into())),
        };

        if let Err(ApplyError::Connection(reason)) = &result {
            // A half-read response would desync the next request
            warn!(id = %mutation.id, reason = %reason, "connection lost");
            *slot = None;
            self.report(false);
        }
        result.map_err(ExecuteError::from)
    }
}

/// Send one apply frame and wait for the matching outcome.
async fn round_trip(
    conn: &mut WebSocketConnection,
    mutation: &Mutation,
) -> Result<(), ApplyError> {
    let json = ClientMessage::apply(mutation.clone())
        .to_json()
        .map_err(|e| ApplyError::Server(format!("serialization error: {e}")))?;

    conn.sink
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| ApplyError::Connection(format!("send failed: {e}")))?;

    loop {
        let text = match conn.stream.next().await {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => {
                return Err(ApplyError::Connection("connection closed".into()));
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(ApplyError::Connection(format!("receive failed: {e}"))),
        };

        match ServerMessage::from_json(&text) {
            Ok(ServerMessage::Ack { id }) if id == mutation.id => return Ok(()),
            Ok(ServerMessage::Rejected { id, message }) if id == mutation.id => {
                return Err(ApplyError::Rejected(message));
            }
            Ok(ServerMessage::Error { message }) => return Err(ApplyError::Server(message)),
            Ok(other) => {
                debug!(message = ?other, "ignoring unrelated server message");
            }
            Err(e) => {
                warn!(error = %e, "ignoring malformed server message");
            }
        }
    }
}

impl RemoteMutationExecutor for WebSocketExecutor {
    fn execute<'a>(&'a self, mutation: &'a Mutation) -> ExecuteFuture<'a> {
        Box::pin(self.apply(mutation))
    }
}
