// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the WebSocket executor against an in-process server.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use offsync_core::protocol::{ClientMessage, ServerMessage};
use offsync_core::{Mutation, MutationAction, MutationId};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use super::connectivity::ConnectivityMonitor;
use super::executor::{ExecuteError, RemoteMutationExecutor};
use super::test_helpers::make_pending;
use super::transport::{TransportConfig, WebSocketExecutor};

/// Scripted server. Behavior is picked by the mutation's collection:
/// - `rejected`: reply with a rejection
/// - `broken`: reply with an error frame
/// - `silent`: never reply
/// - `chatty`: send a pong and a stray ack before the real ack
/// - anything else: ack
struct TestServer {
    url: String,
    connections: Arc<AtomicUsize>,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&connections);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    let (mut sink, mut stream) = ws.split();
                    while let Some(Ok(msg)) = stream.next().await {
                        let Message::Text(text) = msg else { continue };
                        let Ok(ClientMessage::Apply(mutation)) = ClientMessage::from_json(&text)
                        else {
                            continue;
                        };
                        let replies = match mutation.collection.as_str() {
                            "rejected" => {
                                vec![ServerMessage::rejected(mutation.id, "document exists")]
                            }
                            "broken" => vec![ServerMessage::error("disk full")],
                            "silent" => vec![],
                            "chatty" => vec![
                                ServerMessage::pong(7),
                                ServerMessage::ack(MutationId::new("m-other")),
                                ServerMessage::ack(mutation.id),
                            ],
                            _ => vec![ServerMessage::ack(mutation.id)],
                        };
                        for reply in replies {
                            let json = reply.to_json().unwrap();
                            if sink.send(Message::Text(json.into())).await.is_err() {
                                return;
                            }
                        }
                    }
                });
            }
        });

        TestServer {
            url: format!("ws://{}", addr),
            connections,
        }
    }

    fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

fn config(url: &str) -> TransportConfig {
    TransportConfig {
        url: url.to_string(),
        request_timeout: Duration::from_millis(500),
        max_retries: 3,
        initial_delay_ms: 10,
        max_delay_secs: 1,
    }
}

fn mutation(id: &str, collection: &str) -> Mutation {
    make_pending(id, collection, "doc-1").mutation
}

/// A URL nothing is listening on.
async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{}", addr)
}

#[tokio::test]
async fn execute_acked_mutation() {
    let server = TestServer::start().await;
    let monitor = ConnectivityMonitor::new(false);
    let executor = WebSocketExecutor::new(config(&server.url)).with_monitor(monitor.clone());

    executor.execute(&mutation("m-1", "orders")).await.unwrap();

    assert!(executor.is_connected().await);
    assert!(monitor.is_online());
}

#[tokio::test]
async fn connection_is_reused_across_calls() {
    let server = TestServer::start().await;
    let executor = WebSocketExecutor::new(config(&server.url));

    executor.execute(&mutation("m-1", "orders")).await.unwrap();
    executor.execute(&mutation("m-2", "orders")).await.unwrap();
    executor.execute(&mutation("m-3", "orders")).await.unwrap();

    assert_eq!(server.connections(), 1);
}

#[tokio::test]
async fn rejection_is_terminal_and_keeps_connection() {
    let server = TestServer::start().await;
    let executor = WebSocketExecutor::new(config(&server.url));

    let err = executor
        .execute(&mutation("m-1", "rejected"))
        .await
        .unwrap_err();

    assert_eq!(err, ExecuteError::Rejected("document exists".into()));
    assert!(!err.is_retryable());
    assert!(executor.is_connected().await);
}

#[tokio::test]
async fn server_error_is_transient() {
    let server = TestServer::start().await;
    let executor = WebSocketExecutor::new(config(&server.url));

    let err = executor.execute(&mutation("m-1", "broken")).await.unwrap_err();

    assert!(err.is_retryable());
    assert!(executor.is_connected().await);
}

#[tokio::test]
async fn unreachable_server_is_transient_and_reports_offline() {
    let monitor = ConnectivityMonitor::new(true);
    let executor = WebSocketExecutor::new(config(&dead_url().await)).with_monitor(monitor.clone());

    let err = executor.execute(&mutation("m-1", "orders")).await.unwrap_err();

    assert!(matches!(err, ExecuteError::Transient(_)));
    assert!(!monitor.is_online());
    assert!(!executor.is_connected().await);
}

#[tokio::test]
async fn silent_server_times_out_and_drops_connection() {
    let server = TestServer::start().await;
    let monitor = ConnectivityMonitor::new(true);
    let executor = WebSocketExecutor::new(config(&server.url)).with_monitor(monitor.clone());

    let err = executor.execute(&mutation("m-1", "silent")).await.unwrap_err();

    assert_eq!(err, ExecuteError::Transient("request timed out".into()));
    assert!(!executor.is_connected().await);
    assert!(!monitor.is_online());

    // Next call reconnects
    executor.execute(&mutation("m-2", "orders")).await.unwrap();
    assert_eq!(server.connections(), 2);
    assert!(monitor.is_online());
}

#[tokio::test]
async fn unrelated_frames_are_skipped() {
    let server = TestServer::start().await;
    let executor = WebSocketExecutor::new(config(&server.url));

    executor.execute(&mutation("m-1", "chatty")).await.unwrap();
    // The stray frames must not leak into the next round trip
    let err = executor
        .execute(&mutation("m-2", "rejected"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecuteError::Rejected(_)));
}

#[tokio::test]
async fn create_without_document_is_sent_as_is() {
    let server = TestServer::start().await;
    let executor = WebSocketExecutor::new(config(&server.url));
    let now = chrono::Utc::now();
    let create = Mutation::new(
        "orders",
        None,
        MutationAction::Create,
        Some(json!({"total": 3})),
        &now,
    )
    .unwrap();

    executor.execute(&create).await.unwrap();
}

#[tokio::test]
async fn connect_and_disconnect() {
    let server = TestServer::start().await;
    let executor = WebSocketExecutor::new(config(&server.url));
    assert!(!executor.is_connected().await);

    executor.connect().await.unwrap();
    executor.connect().await.unwrap();
    assert!(executor.is_connected().await);
    assert_eq!(server.connections(), 1);

    executor.disconnect().await;
    assert!(!executor.is_connected().await);
}

#[tokio::test]
async fn reconnect_with_backoff_gives_up_after_max_retries() {
    let executor = WebSocketExecutor::new(config(&dead_url().await));

    let result = executor.reconnect_with_backoff().await;

    assert!(matches!(result, Err(ExecuteError::Transient(_))));
    assert!(!executor.is_connected().await);
}

#[tokio::test]
async fn reconnect_with_backoff_succeeds_when_server_is_up() {
    let server = TestServer::start().await;
    let executor = WebSocketExecutor::new(config(&server.url));

    executor.reconnect_with_backoff().await.unwrap();

    assert!(executor.is_connected().await);
}

#[test]
fn default_transport_config() {
    let config = TransportConfig::default();
    assert_eq!(config.url, "ws://localhost:7890");
    assert_eq!(config.request_timeout, Duration::from_secs(10));
    assert_eq!(config.max_retries, 10);
    assert_eq!(config.initial_delay_ms, 100);
    assert_eq!(config.max_delay_secs, 30);
}
