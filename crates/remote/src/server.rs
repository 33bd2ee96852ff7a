// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket server implementation.
//!
//! Every client message gets exactly one response. A request the store
//! refuses is answered with `Rejected`; a message that cannot be parsed is
//! answered with `Error`.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use fieldsync_core::protocol::{ClientMessage, ServerMessage};

use crate::state::ServerState;
use crate::store::StoreError;

/// Run the WebSocket server on the given address.
pub async fn run(addr: SocketAddr, state: ServerState) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on: {}", addr);

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                debug!("Connection error from {}: {}", peer_addr, e);
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
    debug!("New WebSocket connection from: {}", peer_addr);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let response = match handle_client_message(&text, &state).await {
                    Ok(response) => response,
                    Err(e) => {
                        warn!("Bad message from {}: {}", peer_addr, e);
                        ServerMessage::error(e.to_string())
                    }
                };
                let json = response.to_json()?;
                ws_sink.send(Message::Text(json.into())).await?;
            }
            Ok(Message::Close(_)) => {
                debug!("Client {} disconnected", peer_addr);
                break;
            }
            Ok(Message::Ping(data)) => {
                ws_sink.send(Message::Pong(data)).await?;
            }
            Ok(_) => {
                // Binary, Pong and raw frames carry nothing for us
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", peer_addr, e);
                break;
            }
        }
    }

    debug!("Connection closed: {}", peer_addr);
    Ok(())
}

/// Process a client message and return its response.
pub(crate) async fn handle_client_message(
    text: &str,
    state: &ServerState,
) -> Result<ServerMessage, Box<dyn std::error::Error + Send + Sync>> {
    let msg = ClientMessage::from_json(text)?;
    debug!("Received message: {:?}", msg);

    match msg {
        ClientMessage::Probe { id } => Ok(ServerMessage::probe_ok(id)),

        ClientMessage::Whoami { id, token } => {
            let organization_id = state.lookup_tenant(&token).await?;
            if organization_id.is_none() {
                debug!("Unknown session token");
            }
            Ok(ServerMessage::tenant(id, organization_id))
        }

        ClientMessage::Upsert {
            id,
            category,
            record,
        } => match state.upsert(category, record).await {
            Ok(updated_at) => {
                debug!(%category, "Record upserted");
                Ok(ServerMessage::upserted(id, updated_at))
            }
            Err(StoreError::Rejected(message)) => {
                info!(%category, "Upsert rejected: {}", message);
                Ok(ServerMessage::rejected(id, message))
            }
            Err(e) => {
                error!(%category, "Upsert failed: {}", e);
                Ok(ServerMessage::rejected(id, e.to_string()))
            }
        },
    }
}
