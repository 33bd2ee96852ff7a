// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Opportunistic drain when connectivity comes back.

use std::sync::{Arc, Weak};

use crate::coordinator::SyncCoordinator;
use crate::monitor::RestorationHook;
use crate::prefs::Prefs;
use crate::queue::OfflineQueue;
use crate::status::StatusFacade;
use crate::transport::BoxFuture;

/// Restoration hook that drains the queue once, if the user allows it.
///
/// Skipped when auto-sync is turned off or nothing is queued. Failures are
/// logged and never propagated.
pub struct AutoSync {
    prefs: Arc<Prefs>,
    queue: Arc<OfflineQueue>,
    coordinator: Arc<SyncCoordinator>,
    status: Option<Weak<StatusFacade>>,
}

impl AutoSync {
    pub fn new(
        prefs: Arc<Prefs>,
        queue: Arc<OfflineQueue>,
        coordinator: Arc<SyncCoordinator>,
    ) -> Self {
        AutoSync {
            prefs,
            queue,
            coordinator,
            status: None,
        }
    }

    /// Refresh this façade after each opportunistic drain.
    pub fn with_status(mut self, status: &Arc<StatusFacade>) -> Self {
        self.status = Some(Arc::downgrade(status));
        self
    }

    async fn run(&self) {
        if !self.prefs.auto_sync() {
            tracing::debug!("auto-sync disabled, not draining");
            return;
        }

        match self.queue.count() {
            Ok(0) => {
                tracing::debug!("nothing queued, not draining");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "failed to read offline queue");
                return;
            }
        }

        let result = self.coordinator.drain().await;
        if !result.success {
            tracing::warn!(disposition = %result.disposition, "opportunistic sync failed: {}", result.message);
        }

        if let Some(status) = self.status.as_ref().and_then(Weak::upgrade) {
            status.refresh().await;
        }
    }
}

impl RestorationHook for AutoSync {
    fn on_restored(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.run())
    }
}

#[cfg(test)]
#[path = "autosync_tests.rs"]
mod tests;
