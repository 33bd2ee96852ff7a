// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Status façade over the sync engine.
//!
//! Composes the monitor, the queue, the persisted last-sync time and the
//! coordinator into one [`SyncStatus`]. Holds no state of its own beyond
//! the last published snapshot.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use fieldsync_core::{LastSync, SyncResult, SyncStatus};

use crate::coordinator::SyncCoordinator;
use crate::monitor::ConnectivityMonitor;
use crate::prefs::Prefs;
use crate::queue::OfflineQueue;

pub struct StatusFacade {
    monitor: Arc<ConnectivityMonitor>,
    queue: Arc<OfflineQueue>,
    coordinator: Arc<SyncCoordinator>,
    prefs: Arc<Prefs>,
    tx: watch::Sender<SyncStatus>,
}

impl StatusFacade {
    pub fn new(
        monitor: Arc<ConnectivityMonitor>,
        queue: Arc<OfflineQueue>,
        coordinator: Arc<SyncCoordinator>,
        prefs: Arc<Prefs>,
    ) -> Self {
        let (tx, _) = watch::channel(SyncStatus::default());
        StatusFacade {
            monitor,
            queue,
            coordinator,
            prefs,
            tx,
        }
    }

    /// Compose a snapshot. Read-only.
    ///
    /// A queue that cannot be read is reported through `queue_error`.
    pub async fn current_status(&self) -> SyncStatus {
        let is_online = self.monitor.current_status().await.is_online();
        let (pending_count, queue_error) = match self.queue.count() {
            Ok(n) => (n, None),
            Err(e) => {
                tracing::error!(error = %e, "failed to count pending operations");
                (0, Some(e.to_string()))
            }
        };

        SyncStatus {
            is_online,
            pending_count,
            last_sync_time: self.prefs.last_sync(),
            is_syncing: self.coordinator.is_draining(),
            queue_error,
        }
    }

    /// Recompute and publish the snapshot.
    ///
    /// Records the last-sync time when a drain synced items since the
    /// previous refresh.
    pub async fn refresh(&self) -> SyncStatus {
        if self.coordinator.take_unrecorded_success() {
            if let Err(e) = self.prefs.set_last_sync(LastSync::At(Utc::now())) {
                tracing::warn!(error = %e, "failed to record last sync time");
            }
        }

        let status = self.current_status().await;
        self.tx.send_replace(status.clone());
        status
    }

    /// Drain now, publishing the syncing transition around the drain.
    pub async fn trigger_manual_sync(&self) -> SyncResult {
        let mut syncing = self.current_status().await;
        syncing.is_syncing = true;
        self.tx.send_replace(syncing);

        let result = self.coordinator.drain().await;
        self.refresh().await;
        result
    }

    /// Observe every published snapshot.
    pub fn watch(&self) -> watch::Receiver<SyncStatus> {
        self.tx.subscribe()
    }

    /// Refresh every `interval` plus up to `jitter`, until cancelled.
    pub fn spawn_refresh_loop(
        self: &Arc<Self>,
        interval: Duration,
        jitter: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let facade = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let delay = interval + jitter_delay(jitter);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {
                        facade.refresh().await;
                    }
                }
            }
        })
    }
}

fn jitter_delay(jitter: Duration) -> Duration {
    let max = jitter.as_millis() as u64;
    if max == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=max))
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
