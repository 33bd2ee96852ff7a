// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote store abstraction.
//!
//! Provides a trait-based layer over the system of record that enables:
//! - A real WebSocket client for production
//! - In-memory stores for unit testing

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use fieldsync_core::protocol::{ClientMessage, ServerMessage};
use fieldsync_core::{Category, Payload};

/// Boxed future returned by the object-safe traits in this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Error type for remote store operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// The store understood the request and refused it.
    #[error("rejected by remote: {0}")]
    Rejected(String),

    /// The reply could not be read or did not answer the request.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The operation did not finish in time.
    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl RemoteError {
    /// Whether the failure came from the network rather than the store.
    ///
    /// Only these are worth repeating; a rejection or a bad reply would
    /// fail the same way again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RemoteError::ConnectionFailed(_)
                | RemoteError::ConnectionClosed
                | RemoteError::SendFailed(_)
                | RemoteError::ReceiveFailed(_)
        )
    }
}

/// Result type for remote store operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// How often a request is repeated after a transient failure.
///
/// The wait doubles after each failed attempt, starting at `base_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Send once and report the first failure.
    pub fn none() -> Self {
        RetryPolicy {
            attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Wait before the attempt following attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << shift)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// The remote system of record.
///
/// Every upsert is idempotent on the category's natural key, so replaying
/// a record that was already written is harmless.
pub trait RemoteStore: Send + Sync {
    /// Cheap round trip proving the store answers.
    fn probe(&self) -> BoxFuture<'_, RemoteResult<()>>;

    /// Resolve a session token to its organization id.
    ///
    /// `Ok(None)` means the token is unknown or has no membership.
    fn lookup_tenant(&self, token: &str) -> BoxFuture<'_, RemoteResult<Option<String>>>;

    /// Insert or update a record; returns the store's update time.
    fn upsert(
        &self,
        category: Category,
        record: Payload,
    ) -> BoxFuture<'_, RemoteResult<DateTime<Utc>>>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Internal WebSocket connection wrapper.
struct WebSocketConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

/// Remote store reached over a WebSocket using the JSON protocol.
///
/// The connection is opened lazily on first use and dropped on any
/// transport failure, so the next request reconnects. Requests share the
/// connection one at a time; replies are matched to requests by id and
/// stale replies from abandoned requests are skipped.
///
/// Transient failures are retried under the store's [`RetryPolicy`], each
/// attempt on a fresh connection with a fresh request id.
pub struct WsRemoteStore {
    url: String,
    connect_timeout: Duration,
    retry: RetryPolicy,
    conn: Mutex<Option<WebSocketConnection>>,
    next_id: AtomicU64,
}

impl WsRemoteStore {
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Self {
        WsRemoteStore {
            url: url.into(),
            connect_timeout,
            retry: RetryPolicy::default(),
            conn: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Close the connection if one is open.
    pub async fn close(&self) {
        if let Some(mut ws) = self.conn.lock().await.take() {
            let _ = ws.sink.close().await;
        }
    }

    async fn connect(&self) -> RemoteResult<WebSocketConnection> {
        let connecting = tokio_tungstenite::connect_async(&self.url);
        let (ws_stream, _) = tokio::time::timeout(self.connect_timeout, connecting)
            .await
            .map_err(|_| RemoteError::Timeout {
                operation: "connect",
                after: self.connect_timeout,
            })?
            .map_err(|e| RemoteError::ConnectionFailed(e.to_string()))?;

        tracing::debug!(url = %self.url, "connected to remote store");
        let (sink, stream) = ws_stream.split();
        Ok(WebSocketConnection { sink, stream })
    }

    async fn request(&self, build: impl Fn(u64) -> ClientMessage) -> RemoteResult<ServerMessage> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.request_once(&build).await {
                Err(e) if e.is_transient() && attempt < attempts => {
                    let delay = self.retry.delay_after(attempt);
                    tracing::warn!(
                        error = %e,
                        attempt,
                        attempts,
                        delay_ms = delay.as_millis() as u64,
                        "remote request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn request_once(
        &self,
        build: &impl Fn(u64) -> ClientMessage,
    ) -> RemoteResult<ServerMessage> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let json = build(id)
            .to_json()
            .map_err(|e| RemoteError::Protocol(e.to_string()))?;

        let mut conn = self.conn.lock().await;
        if conn.is_none() {
            *conn = Some(self.connect().await?);
        }
        let ws = conn.as_mut().ok_or(RemoteError::ConnectionClosed)?;

        if let Err(e) = ws.sink.send(Message::Text(json.into())).await {
            // Connection is broken, clear it
            *conn = None;
            return Err(RemoteError::SendFailed(e.to_string()));
        }

        loop {
            match ws.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    let reply = ServerMessage::from_json(&text)
                        .map_err(|e| RemoteError::Protocol(e.to_string()))?;
                    match reply.request_id() {
                        Some(rid) if rid == id => return Ok(reply),
                        // Reply to a request whose caller gave up
                        Some(_) => continue,
                        None => {
                            let message = match reply {
                                ServerMessage::Error { message } => message,
                                other => format!("unexpected reply: {:?}", other),
                            };
                            return Err(RemoteError::Protocol(message));
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    *conn = None;
                    return Err(RemoteError::ConnectionClosed);
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    *conn = None;
                    return Err(RemoteError::ReceiveFailed(e.to_string()));
                }
            }
        }
    }
}

fn unexpected(reply: ServerMessage) -> RemoteError {
    match reply {
        ServerMessage::Rejected { message, .. } => RemoteError::Rejected(message),
        other => RemoteError::Protocol(format!("unexpected reply: {:?}", other)),
    }
}

impl RemoteStore for WsRemoteStore {
    fn probe(&self) -> BoxFuture<'_, RemoteResult<()>> {
        Box::pin(async move {
            match self.request(ClientMessage::probe).await? {
                ServerMessage::ProbeOk { .. } => Ok(()),
                other => Err(unexpected(other)),
            }
        })
    }

    fn lookup_tenant(&self, token: &str) -> BoxFuture<'_, RemoteResult<Option<String>>> {
        let token = token.to_string();
        Box::pin(async move {
            match self.request(|id| ClientMessage::whoami(id, token.clone())).await? {
                ServerMessage::Tenant {
                    organization_id, ..
                } => Ok(organization_id),
                other => Err(unexpected(other)),
            }
        })
    }

    fn upsert(
        &self,
        category: Category,
        record: Payload,
    ) -> BoxFuture<'_, RemoteResult<DateTime<Utc>>> {
        Box::pin(async move {
            match self
                .request(|id| ClientMessage::upsert(id, category, record.clone()))
                .await?
            {
                ServerMessage::Upserted { updated_at, .. } => Ok(updated_at),
                other => Err(unexpected(other)),
            }
        })
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
