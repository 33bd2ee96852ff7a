// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity monitoring with edge-triggered restoration events.
//!
//! The monitor wraps a [`NetworkState`] primitive. Platform events pushed
//! through [`ConnectivityMonitor::report`] land in a single-slot channel
//! where the newest status replaces any unread one; a tick task takes that
//! status and compares its online flag with the last published one.
//! Flapping between two ticks therefore collapses into at most one
//! transition.
//!
//! ```text
//! report() ──► watch(1) ──► tick ──► process() ──► watch (status)
//!                             ▲                 └─► broadcast (Restored/Lost)
//!              fetch() ───────┘                 └─► RestorationHook (spawned)
//! ```

use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use fieldsync_core::ConnectivityStatus;

use crate::net::NetworkState;
use crate::transport::BoxFuture;

/// Capacity of the edge event broadcast.
const EVENT_CAPACITY: usize = 16;

/// An online/offline transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// Offline to online.
    Restored,
    /// Online to offline.
    Lost,
}

/// Invoked once per restoration, fire-and-forget.
pub trait RestorationHook: Send + Sync {
    fn on_restored(&self) -> BoxFuture<'_, ()>;
}

/// Handle to connectivity status updates.
///
/// Sees the last known status immediately and every change after.
/// Dropping it unsubscribes.
pub struct Subscription {
    rx: watch::Receiver<ConnectivityStatus>,
}

impl Subscription {
    /// The latest status seen by the monitor.
    pub fn current(&self) -> ConnectivityStatus {
        self.rx.borrow().clone()
    }

    /// Wait for the next status change.
    ///
    /// Returns `None` once the monitor is gone.
    pub async fn changed(&mut self) -> Option<ConnectivityStatus> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

struct TickTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Observes reachability and raises restored/lost edges.
pub struct ConnectivityMonitor {
    network: Arc<dyn NetworkState>,
    tick: Duration,
    status_tx: watch::Sender<ConnectivityStatus>,
    events_tx: broadcast::Sender<ConnectivityEvent>,
    /// Newest reported status not yet taken by a tick.
    reported: watch::Sender<Option<ConnectivityStatus>>,
    /// Online flag of the last processed status.
    last_online: Mutex<bool>,
    hook: RwLock<Option<Arc<dyn RestorationHook>>>,
    task: Mutex<Option<TickTask>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl ConnectivityMonitor {
    pub fn new(network: Arc<dyn NetworkState>, tick: Duration) -> Self {
        let (status_tx, _) = watch::channel(ConnectivityStatus::offline());
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (reported, _) = watch::channel(None);

        ConnectivityMonitor {
            network,
            tick,
            status_tx,
            events_tx,
            reported,
            last_online: Mutex::new(false),
            hook: RwLock::new(None),
            task: Mutex::new(None),
        }
    }

    /// Register the hook run on every restoration.
    pub fn set_restoration_hook(&self, hook: Arc<dyn RestorationHook>) {
        *self.hook.write().unwrap_or_else(|e| e.into_inner()) = Some(hook);
    }

    /// Fresh reading from the platform primitive.
    ///
    /// A primitive failure yields the conservative offline status.
    pub async fn current_status(&self) -> ConnectivityStatus {
        match self.network.fetch().await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(error = %e, "network state unavailable, assuming offline");
                ConnectivityStatus::offline()
            }
        }
    }

    /// Last status published by the monitor, without touching the network.
    pub fn last_status(&self) -> ConnectivityStatus {
        self.status_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.status_tx.subscribe(),
        }
    }

    pub fn events(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events_tx.subscribe()
    }

    /// Push a platform event.
    ///
    /// Never blocks. A status not yet taken by a tick is replaced.
    pub fn report(&self, status: ConnectivityStatus) {
        self.reported.send_replace(Some(status));
    }

    /// Whether the tick task is running.
    pub fn is_running(&self) -> bool {
        lock(&self.task).is_some()
    }

    /// Start the tick task. Does nothing if already started.
    ///
    /// The first reading only sets the baseline and raises no event.
    pub fn start(self: &Arc<Self>) {
        let mut task = lock(&self.task);
        if task.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        let monitor = Arc::clone(self);
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            monitor.seed().await;

            let mut interval = tokio::time::interval(monitor.tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        monitor.tick_once().await;
                    }
                }
            }
            tracing::debug!("connectivity monitor stopped");
        });

        *task = Some(TickTask { cancel, handle });
        tracing::debug!(tick_ms = self.tick.as_millis() as u64, "connectivity monitor started");
    }

    /// Stop the tick task. Does nothing if not started.
    pub async fn stop(&self) {
        let task = lock(&self.task).take();
        if let Some(task) = task {
            task.cancel.cancel();
            let _ = task.handle.await;
        }
    }

    async fn seed(&self) {
        let status = self.current_status().await;
        *lock(&self.last_online) = status.is_online();
        self.publish(status);
    }

    /// One tick: newest reported status, or a fresh fetch when none arrived.
    pub async fn tick_once(&self) -> Option<ConnectivityEvent> {
        let status = match self.reported.send_replace(None) {
            Some(status) => status,
            None => self.current_status().await,
        };
        self.process(status)
    }

    /// Edge detection for a single status.
    ///
    /// Publishes the status, and on a transition broadcasts the edge.
    /// A restoration also spawns the registered hook.
    pub fn process(&self, status: ConnectivityStatus) -> Option<ConnectivityEvent> {
        let online = status.is_online();
        let was_online = std::mem::replace(&mut *lock(&self.last_online), online);
        self.publish(status);

        let event = match (was_online, online) {
            (false, true) => ConnectivityEvent::Restored,
            (true, false) => ConnectivityEvent::Lost,
            _ => return None,
        };

        // No receivers is fine
        let _ = self.events_tx.send(event);

        match event {
            ConnectivityEvent::Restored => {
                tracing::info!("connection restored");
                self.spawn_hook();
            }
            ConnectivityEvent::Lost => tracing::info!("connection lost"),
        }
        Some(event)
    }

    fn publish(&self, status: ConnectivityStatus) {
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    fn spawn_hook(&self) {
        let hook = self
            .hook
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(Arc::clone);
        if let Some(hook) = hook {
            tokio::spawn(async move {
                hook.on_restored().await;
            });
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
