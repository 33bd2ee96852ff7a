// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Wiring of the sync engine for one data directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::autosync::AutoSync;
use crate::config::Config;
use crate::coordinator::SyncCoordinator;
use crate::error::Result;
use crate::monitor::ConnectivityMonitor;
use crate::net::{NetworkState, SocketNetworkState};
use crate::prefs::Prefs;
use crate::queue::OfflineQueue;
use crate::status::StatusFacade;
use crate::tenant::SessionTenantResolver;
use crate::transport::{RemoteStore, WsRemoteStore};

/// All engine components built over a data directory.
pub struct Engine {
    pub data_dir: PathBuf,
    pub config: Config,
    pub queue: Arc<OfflineQueue>,
    pub prefs: Arc<Prefs>,
    pub monitor: Arc<ConnectivityMonitor>,
    pub coordinator: Arc<SyncCoordinator>,
    pub status: Arc<StatusFacade>,
}

impl Engine {
    /// Build the engine with the socket network primitive and the WebSocket store.
    pub fn open(data_dir: &Path, config: Config) -> Result<Self> {
        let network = Arc::new(SocketNetworkState::new(
            config.network.probe_host.clone(),
            config.network.probe_timeout(),
            config.network.transport,
        ));
        let remote = Arc::new(
            WsRemoteStore::new(config.remote.url.clone(), config.remote.connect_timeout())
                .with_retry(config.remote.retry()),
        );
        Self::with_parts(data_dir, config, network, remote)
    }

    /// Build the engine over the given network primitive and remote store.
    ///
    /// Registers the auto-sync hook on the monitor; the monitor is not started.
    pub fn with_parts(
        data_dir: &Path,
        config: Config,
        network: Arc<dyn NetworkState>,
        remote: Arc<dyn RemoteStore>,
    ) -> Result<Self> {
        let queue = Arc::new(OfflineQueue::open(&data_dir.join(OfflineQueue::FILE_NAME))?);
        let prefs = Arc::new(Prefs::new(
            &data_dir.join(Prefs::FILE_NAME),
            config.sync.auto_sync_default,
        ));
        let monitor = Arc::new(ConnectivityMonitor::new(network, config.sync.monitor_tick()));
        let tenants = Arc::new(SessionTenantResolver::new(prefs.clone(), remote.clone()));
        let coordinator = Arc::new(SyncCoordinator::new(
            queue.clone(),
            monitor.clone(),
            remote,
            tenants,
            config.sync_config(),
        ));
        let status = Arc::new(StatusFacade::new(
            monitor.clone(),
            queue.clone(),
            coordinator.clone(),
            prefs.clone(),
        ));

        let auto_sync = AutoSync::new(prefs.clone(), queue.clone(), coordinator.clone())
            .with_status(&status);
        monitor.set_restoration_hook(Arc::new(auto_sync));

        Ok(Engine {
            data_dir: data_dir.to_path_buf(),
            config,
            queue,
            prefs,
            monitor,
            coordinator,
            status,
        })
    }

    /// Start the monitor and the periodic status refresh.
    ///
    /// The refresh loop stops when `cancel` fires; call [`Engine::stop`] for
    /// the monitor.
    pub fn start(&self, cancel: CancellationToken) -> JoinHandle<()> {
        self.monitor.start();
        self.status.spawn_refresh_loop(
            self.config.sync.refresh_interval(),
            self.config.sync.refresh_jitter(),
            cancel,
        )
    }

    pub async fn stop(&self) {
        self.monitor.stop().await;
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
