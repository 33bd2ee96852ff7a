// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight drain of the offline queue.
//!
//! A drain runs `Idle -> Preflighting -> Draining -> Idle`:
//!
//! 1. Preflight: the monitor must report the device online and the remote
//!    store must answer a probe. Otherwise the queue is left untouched.
//! 2. The tenant is resolved once. Without one the drain is skipped; a
//!    lookup that does not answer in time counts as offline.
//! 3. Entries are upserted one at a time, by category in referential order
//!    and in insertion order within a category. Each failure is recorded
//!    and the drain moves on.
//! 4. Confirmed entries are removed from the queue in a single call.
//!
//! Only one drain runs per coordinator. The state is claimed with a
//! compare-and-swap before the first suspension point and released by a
//! drop guard, so it returns to `Idle` however the drain ends.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use fieldsync_core::record::prepare_record;
use fieldsync_core::{ItemError, LocalId, PendingOperation, SyncResult};

use crate::monitor::ConnectivityMonitor;
use crate::queue::{OfflineQueue, QueueEntry};
use crate::tenant::TenantResolver;
use crate::transport::{RemoteError, RemoteStore};

/// Drain state values for the atomic state field.
pub const STATE_IDLE: u8 = 0;
pub const STATE_PREFLIGHTING: u8 = 1;
pub const STATE_DRAINING: u8 = 2;

/// Reason reported when the device or the remote store is unreachable.
pub const NO_CONNECTION: &str = "No internet connection";

/// Observable drain state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    Idle,
    Preflighting,
    Draining,
}

/// Timeouts applied during a drain.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Bound on the preflight probe.
    pub probe_timeout: Duration,
    /// Bound on tenant resolution.
    pub tenant_timeout: Duration,
    /// Bound on each record upsert.
    pub upsert_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            probe_timeout: Duration::from_secs(3),
            tenant_timeout: Duration::from_secs(5),
            upsert_timeout: Duration::from_secs(10),
        }
    }
}

/// Resets the drain state when dropped.
struct DrainGuard<'a> {
    state: &'a AtomicU8,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.state.store(STATE_IDLE, Ordering::Release);
    }
}

/// Drains the offline queue against the remote store.
pub struct SyncCoordinator {
    queue: Arc<OfflineQueue>,
    monitor: Arc<ConnectivityMonitor>,
    remote: Arc<dyn RemoteStore>,
    tenants: Arc<dyn TenantResolver>,
    config: SyncConfig,
    state: AtomicU8,
    /// Set when a drain removed items and nobody has recorded it yet.
    unrecorded_success: AtomicBool,
}

impl SyncCoordinator {
    pub fn new(
        queue: Arc<OfflineQueue>,
        monitor: Arc<ConnectivityMonitor>,
        remote: Arc<dyn RemoteStore>,
        tenants: Arc<dyn TenantResolver>,
        config: SyncConfig,
    ) -> Self {
        SyncCoordinator {
            queue,
            monitor,
            remote,
            tenants,
            config,
            state: AtomicU8::new(STATE_IDLE),
            unrecorded_success: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> DrainState {
        match self.state.load(Ordering::Acquire) {
            STATE_PREFLIGHTING => DrainState::Preflighting,
            STATE_DRAINING => DrainState::Draining,
            _ => DrainState::Idle,
        }
    }

    /// Whether a drain is in progress.
    pub fn is_draining(&self) -> bool {
        self.state() != DrainState::Idle
    }

    /// Consume the marker left by a drain that synced at least one item.
    pub fn take_unrecorded_success(&self) -> bool {
        self.unrecorded_success.swap(false, Ordering::AcqRel)
    }

    /// Drain the queue once.
    ///
    /// Never fails: every outcome, including a concurrent drain, an
    /// unreachable store or a storage error, is described by the result.
    pub async fn drain(&self) -> SyncResult {
        if self
            .state
            .compare_exchange(
                STATE_IDLE,
                STATE_PREFLIGHTING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            tracing::debug!("drain requested while another is running");
            return SyncResult::already_in_progress();
        }
        let _guard = DrainGuard { state: &self.state };

        let result = self.run().instrument(tracing::info_span!("drain")).await;
        tracing::info!(
            disposition = %result.disposition,
            synced = result.synced_item_count,
            failed = result.failed_item_count(),
            "{}",
            result.message
        );
        result
    }

    async fn run(&self) -> SyncResult {
        if let Err(reason) = self.preflight().await {
            return SyncResult::offline(reason);
        }

        let resolving = self.tenants.resolve();
        let tenant = match tokio::time::timeout(self.config.tenant_timeout, resolving).await {
            Ok(Ok(tenant)) => tenant,
            Ok(Err(e)) => {
                tracing::info!(reason = %e, "no tenant context, skipping drain");
                return SyncResult::no_tenant();
            }
            Err(_) => {
                let err = RemoteError::Timeout {
                    operation: "tenant lookup",
                    after: self.config.tenant_timeout,
                };
                tracing::info!(error = %err, "remote store stalled");
                return SyncResult::offline(format!(
                    "{} (remote store unreachable: {})",
                    NO_CONNECTION, err
                ));
            }
        };

        self.state.store(STATE_DRAINING, Ordering::Release);

        let mut entries = match self.queue.list_pending(None) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(error = %e, "failed to read offline queue");
                return SyncResult::storage_failed(
                    format!("failed to read offline queue: {}", e),
                    Vec::new(),
                );
            }
        };
        // Stable: insertion order is kept within a category
        entries.sort_by_key(|entry| entry.category().map_or(usize::MAX, |c| c.drain_rank()));

        let mut succeeded: HashSet<LocalId> = HashSet::new();
        let mut item_errors = Vec::new();
        for entry in entries {
            match entry {
                QueueEntry::Pending(op) => match self.apply(&op, &tenant).await {
                    Ok(()) => {
                        tracing::debug!(local_id = %op.local_id, category = %op.category, "synced");
                        succeeded.insert(op.local_id);
                    }
                    Err(message) => {
                        tracing::debug!(local_id = %op.local_id, category = %op.category, %message, "sync failed");
                        item_errors.push(ItemError {
                            category: Some(op.category),
                            local_id: op.local_id,
                            message,
                        });
                    }
                },
                QueueEntry::Malformed(entry) => {
                    tracing::warn!(local_id = %entry.local_id, reason = %entry.reason, "malformed queue entry");
                    item_errors.push(ItemError {
                        category: entry.category,
                        local_id: entry.local_id,
                        message: entry.reason,
                    });
                }
            }
        }

        if succeeded.is_empty() {
            return SyncResult::completed(0, item_errors);
        }

        match self.queue.remove(&succeeded) {
            Ok(removed) => {
                if removed > 0 {
                    self.unrecorded_success.store(true, Ordering::Release);
                }
                SyncResult::completed(removed, item_errors)
            }
            Err(e) => {
                tracing::error!(error = %e, pending = succeeded.len(), "failed to remove synced items");
                SyncResult::storage_failed(
                    format!("failed to remove synced items: {}", e),
                    item_errors,
                )
            }
        }
    }

    async fn preflight(&self) -> Result<(), String> {
        if !self.monitor.current_status().await.is_online() {
            return Err(NO_CONNECTION.to_string());
        }

        let probe = tokio::time::timeout(self.config.probe_timeout, self.remote.probe()).await;
        let err = match probe {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => e,
            Err(_) => RemoteError::Timeout {
                operation: "probe",
                after: self.config.probe_timeout,
            },
        };
        tracing::info!(error = %err, "remote store unreachable");
        Err(format!("{} (remote store unreachable: {})", NO_CONNECTION, err))
    }

    async fn apply(&self, op: &PendingOperation, tenant: &str) -> Result<(), String> {
        let record = prepare_record(op, tenant).map_err(|e| e.to_string())?;

        let upsert = self.remote.upsert(op.category, record);
        match tokio::time::timeout(self.config.upsert_timeout, upsert).await {
            Ok(Ok(_updated_at)) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(RemoteError::Timeout {
                operation: "upsert",
                after: self.config.upsert_timeout,
            }
            .to_string()),
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
