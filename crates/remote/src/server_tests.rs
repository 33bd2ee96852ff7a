// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Test server utilities for integration testing.
//!
//! Provides a TestServer that runs on a random port against a fresh
//! record store.

#![cfg(test)]
#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::server;
use crate::state::ServerState;

/// A test server that runs on a random port and can be controlled.
pub struct TestServer {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    state: ServerState,
    /// Keep the temp directory alive for the lifetime of the test server.
    _temp_dir: tempfile::TempDir,
}

impl TestServer {
    /// Start a new test server on a random available port.
    pub async fn start() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = ServerState::new(temp_dir.path()).unwrap();
        state.add_session("tok", "org-1").await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let state_clone = state.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = accept_loop(listener, state_clone) => {
                    if let Err(e) = result {
                        eprintln!("Test server error: {}", e);
                    }
                }
                _ = shutdown_rx => {}
            }
        });

        TestServer {
            addr,
            shutdown_tx,
            state,
            _temp_dir: temp_dir,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the WebSocket URL for connecting to this server.
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Get access to the server state for verification.
    pub fn state(&self) -> &ServerState {
        &self.state
    }

    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Accept loop that uses the actual server::handle_connection.
async fn accept_loop(
    listener: TcpListener,
    state: ServerState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            let _ = server::handle_connection(stream, peer_addr, state).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream::{SplitSink, SplitStream};
    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use tokio::time::{timeout, Duration};
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    use fieldsync_core::protocol::{ClientMessage, ServerMessage};
    use fieldsync_core::{Category, Payload};

    type Ws = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

    struct Client {
        sink: SplitSink<Ws, Message>,
        stream: SplitStream<Ws>,
    }

    impl Client {
        async fn connect(server: &TestServer) -> Self {
            let (ws, _) = connect_async(&server.ws_url()).await.unwrap();
            let (sink, stream) = ws.split();
            Client { sink, stream }
        }

        async fn send_text(&mut self, text: String) -> ServerMessage {
            self.sink.send(Message::Text(text.into())).await.unwrap();
            let reply = timeout(Duration::from_secs(5), self.stream.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            match reply {
                Message::Text(text) => ServerMessage::from_json(&text).unwrap(),
                other => ServerMessage::error(format!("unexpected frame: {:?}", other)),
            }
        }

        async fn request(&mut self, msg: ClientMessage) -> ServerMessage {
            self.send_text(msg.to_json().unwrap()).await
        }
    }

    fn record(value: serde_json::Value) -> Payload {
        match value {
            serde_json::Value::Object(map) => map,
            _ => Payload::new(),
        }
    }

    #[tokio::test]
    async fn test_server_starts() {
        let server = TestServer::start().await;
        assert!(server.addr().port() > 0);
        server.shutdown();
    }

    #[tokio::test]
    async fn test_probe() {
        let server = TestServer::start().await;
        let mut client = Client::connect(&server).await;

        let reply = client.request(ClientMessage::probe(7)).await;
        assert_eq!(reply, ServerMessage::probe_ok(7));
        server.shutdown();
    }

    #[tokio::test]
    async fn test_whoami_known_and_unknown_tokens() {
        let server = TestServer::start().await;
        let mut client = Client::connect(&server).await;

        let reply = client.request(ClientMessage::whoami(1, "tok")).await;
        assert_eq!(reply, ServerMessage::tenant(1, Some("org-1".to_string())));

        let reply = client.request(ClientMessage::whoami(2, "nope")).await;
        assert_eq!(reply, ServerMessage::tenant(2, None));
        server.shutdown();
    }

    #[tokio::test]
    async fn test_upsert_stores_record() {
        let server = TestServer::start().await;
        let mut client = Client::connect(&server).await;

        let reply = client
            .request(ClientMessage::upsert(
                3,
                Category::Customer,
                record(json!({"organization_id": "org-1", "customer_id": "C-1", "name": "Acme"})),
            ))
            .await;
        assert!(matches!(reply, ServerMessage::Upserted { id: 3, .. }));

        let stored = server
            .state()
            .get("org-1", Category::Customer, "C-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["name"], "Acme");
        server.shutdown();
    }

    #[tokio::test]
    async fn test_repeated_upsert_keeps_one_record() {
        let server = TestServer::start().await;
        let mut client = Client::connect(&server).await;
        let scan = record(json!({
            "organization_id": "org-1",
            "barcode": "A1",
            "order_number": "SO-1",
            "mode": "SHIP",
            "timestamp": "2026-03-01T10:00:00Z",
        }));

        for id in 0..3 {
            let reply = client
                .request(ClientMessage::upsert(id, Category::Scan, scan.clone()))
                .await;
            assert!(matches!(reply, ServerMessage::Upserted { .. }));
        }

        let count = server.state().count("org-1", Category::Scan).await.unwrap();
        assert_eq!(count, 1);
        server.shutdown();
    }

    #[tokio::test]
    async fn test_upsert_without_tenant_is_rejected() {
        let server = TestServer::start().await;
        let mut client = Client::connect(&server).await;

        let reply = client
            .request(ClientMessage::upsert(
                4,
                Category::Asset,
                record(json!({"barcode": "A1"})),
            ))
            .await;
        match reply {
            ServerMessage::Rejected { id, message } => {
                assert_eq!(id, 4);
                assert!(message.contains("organization_id"));
            }
            other => unreachable!("expected rejection, got {:?}", other),
        }
        server.shutdown();
    }

    #[tokio::test]
    async fn test_invalid_json_gets_error_and_connection_survives() {
        let server = TestServer::start().await;
        let mut client = Client::connect(&server).await;

        let reply = client.send_text("{not json".to_string()).await;
        assert!(matches!(reply, ServerMessage::Error { .. }));

        let reply = client.request(ClientMessage::probe(9)).await;
        assert_eq!(reply, ServerMessage::probe_ok(9));
        server.shutdown();
    }

    #[tokio::test]
    async fn test_ping_gets_pong() {
        let server = TestServer::start().await;
        let mut client = Client::connect(&server).await;

        client
            .sink
            .send(Message::Ping(vec![1, 2, 3].into()))
            .await
            .unwrap();
        let reply = timeout(Duration::from_secs(5), client.stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(matches!(reply, Message::Pong(_)));
        server.shutdown();
    }

    #[tokio::test]
    async fn test_clients_share_state() {
        let server = TestServer::start().await;
        let mut first = Client::connect(&server).await;
        let mut second = Client::connect(&server).await;
        let asset = record(json!({"organization_id": "org-1", "barcode": "A1"}));

        first
            .request(ClientMessage::upsert(1, Category::Asset, asset.clone()))
            .await;
        second
            .request(ClientMessage::upsert(1, Category::Asset, asset))
            .await;

        let count = server.state().count("org-1", Category::Asset).await.unwrap();
        assert_eq!(count, 1);
        server.shutdown();
    }
}
