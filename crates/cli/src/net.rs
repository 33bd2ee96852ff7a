// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Platform network primitive.

use std::io;
use std::time::Duration;

use tokio::net::{TcpStream, UdpSocket};

use fieldsync_core::{ConnectivityStatus, TransportType};

use crate::transport::BoxFuture;

/// Source of point-in-time connectivity assessments.
pub trait NetworkState: Send + Sync {
    /// Read the current network state.
    fn fetch(&self) -> BoxFuture<'_, io::Result<ConnectivityStatus>>;
}

/// Desktop network primitive built on plain sockets.
///
/// Link reachability is a UDP route lookup towards the probe host (no packet
/// is sent). Internet reachability is a TCP connect to the probe host within
/// the probe timeout; a refused connection still proves the host answered.
pub struct SocketNetworkState {
    probe_host: String,
    probe_timeout: Duration,
    transport: TransportType,
}

impl SocketNetworkState {
    pub fn new(
        probe_host: impl Into<String>,
        probe_timeout: Duration,
        transport: TransportType,
    ) -> Self {
        SocketNetworkState {
            probe_host: probe_host.into(),
            probe_timeout,
            transport,
        }
    }

    async fn assess(&self) -> io::Result<ConnectivityStatus> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        if let Err(e) = socket.connect(&self.probe_host).await {
            tracing::debug!(host = %self.probe_host, error = %e, "no route to probe host");
            return Ok(ConnectivityStatus::offline());
        }

        let reachable =
            match tokio::time::timeout(self.probe_timeout, TcpStream::connect(&self.probe_host))
                .await
            {
                Ok(Ok(_)) => true,
                Ok(Err(e)) => e.kind() == io::ErrorKind::ConnectionRefused,
                Err(_) => false,
            };

        Ok(ConnectivityStatus {
            is_connected: true,
            is_internet_reachable: Some(reachable),
            transport_type: self.transport,
        })
    }
}

impl NetworkState for SocketNetworkState {
    fn fetch(&self) -> BoxFuture<'_, io::Result<ConnectivityStatus>> {
        Box::pin(self.assess())
    }
}

#[cfg(test)]
#[path = "net_tests.rs"]
mod tests;
