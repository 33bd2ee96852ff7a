// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fakes for engine tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

use fieldsync_core::record::{natural_key, TENANT_FIELD};
use fieldsync_core::{Category, ConnectivityStatus, Payload, PendingOperationInput, TransportType};

use crate::coordinator::{SyncConfig, SyncCoordinator};
use crate::monitor::ConnectivityMonitor;
use crate::net::NetworkState;
use crate::prefs::Prefs;
use crate::queue::OfflineQueue;
use crate::tenant::SessionTenantResolver;
use crate::transport::{BoxFuture, RemoteError, RemoteResult, RemoteStore};

/// Build an enqueue input from a JSON literal.
pub fn make_input(category: Category, payload: Value) -> PendingOperationInput {
    PendingOperationInput::from_value(category, payload).unwrap()
}

/// Open a queue file inside `dir`.
pub fn open_queue(dir: &Path) -> Arc<OfflineQueue> {
    Arc::new(OfflineQueue::open(&dir.join(OfflineQueue::FILE_NAME)).unwrap())
}

/// Network primitive whose readings are set by the test.
pub struct FakeNetwork {
    status: Mutex<io::Result<ConnectivityStatus>>,
    fetches: AtomicUsize,
}

impl FakeNetwork {
    pub fn online() -> Arc<Self> {
        Self::with(Ok(ConnectivityStatus::online(TransportType::Wifi)))
    }

    pub fn offline() -> Arc<Self> {
        Self::with(Ok(ConnectivityStatus::offline()))
    }

    fn with(status: io::Result<ConnectivityStatus>) -> Arc<Self> {
        Arc::new(FakeNetwork {
            status: Mutex::new(status),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, status: ConnectivityStatus) {
        *self.status.lock().unwrap() = Ok(status);
    }

    pub fn set_online(&self, online: bool) {
        self.set(if online {
            ConnectivityStatus::online(TransportType::Wifi)
        } else {
            ConnectivityStatus::offline()
        });
    }

    /// Make every fetch fail.
    pub fn fail(&self) {
        *self.status.lock().unwrap() = Err(io::Error::other("network state unavailable"));
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl NetworkState for FakeNetwork {
    fn fetch(&self) -> BoxFuture<'_, io::Result<ConnectivityStatus>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let result = match &*self.status.lock().unwrap() {
            Ok(status) => Ok(status.clone()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        Box::pin(async move { result })
    }
}

/// Monitor over a fake network, not started.
pub fn make_monitor(network: Arc<FakeNetwork>) -> Arc<ConnectivityMonitor> {
    Arc::new(ConnectivityMonitor::new(network, Duration::from_millis(10)))
}

/// Engine pieces wired over fakes, with session `tok` in `org-1`.
pub struct Parts {
    pub dir: tempfile::TempDir,
    pub queue: Arc<OfflineQueue>,
    pub network: Arc<FakeNetwork>,
    pub monitor: Arc<ConnectivityMonitor>,
    pub remote: Arc<MockRemote>,
    pub prefs: Arc<Prefs>,
    pub coordinator: Arc<SyncCoordinator>,
}

pub fn make_parts() -> Parts {
    let dir = tempfile::tempdir().unwrap();
    let queue = open_queue(dir.path());
    let network = FakeNetwork::online();
    let monitor = make_monitor(network.clone());
    let remote = MockRemote::with_session("tok", "org-1");
    let prefs = Arc::new(Prefs::new(&dir.path().join(Prefs::FILE_NAME), true));
    prefs.set_session_token(Some("tok")).unwrap();
    let tenants = Arc::new(SessionTenantResolver::new(prefs.clone(), remote.clone()));
    let coordinator = Arc::new(SyncCoordinator::new(
        queue.clone(),
        monitor.clone(),
        remote.clone(),
        tenants,
        SyncConfig::default(),
    ));

    Parts {
        dir,
        queue,
        network,
        monitor,
        remote,
        prefs,
        coordinator,
    }
}

/// Poll `cond` every few milliseconds for up to two seconds.
pub async fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
    for _ in 0..400 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

type FailRule = Box<dyn Fn(Category, &Payload) -> Option<RemoteError> + Send + Sync>;

/// In-memory remote store keyed like the real one.
///
/// Records live under (organization, collection, natural key), so writing
/// the same record twice leaves one row.
#[derive(Default)]
pub struct MockRemote {
    records: Mutex<HashMap<(String, &'static str, String), Payload>>,
    tenants: Mutex<HashMap<String, String>>,
    unreachable: AtomicBool,
    lookup_fails: AtomicBool,
    latency: Mutex<Duration>,
    hang_on: Mutex<Option<String>>,
    panic_on: Mutex<Option<String>>,
    fail_rule: Mutex<Option<FailRule>>,
    upsert_calls: AtomicUsize,
    probe_calls: AtomicUsize,
    order: Mutex<Vec<Category>>,
}

impl MockRemote {
    /// A reachable store where `token` belongs to `org`.
    pub fn with_session(token: &str, org: &str) -> Arc<Self> {
        let remote = MockRemote::default();
        remote.add_session(token, org);
        Arc::new(remote)
    }

    pub fn add_session(&self, token: &str, org: &str) {
        self.tenants
            .lock()
            .unwrap()
            .insert(token.to_string(), org.to_string());
    }

    /// Make probes fail.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Make tenant lookups fail with a transport error.
    pub fn fail_lookups(&self) {
        self.lookup_fails.store(true, Ordering::SeqCst);
    }

    /// Delay every call, so drains suspend.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Upserts of records with this barcode never complete.
    pub fn hang_on_barcode(&self, barcode: &str) {
        *self.hang_on.lock().unwrap() = Some(barcode.to_string());
    }

    /// Upserts of records with this barcode panic.
    pub fn panic_on_barcode(&self, barcode: &str) {
        *self.panic_on.lock().unwrap() = Some(barcode.to_string());
    }

    /// Reject upserts matching the rule.
    pub fn fail_when<F>(&self, rule: F)
    where
        F: Fn(Category, &Payload) -> Option<RemoteError> + Send + Sync + 'static,
    {
        *self.fail_rule.lock().unwrap() = Some(Box::new(rule));
    }

    /// Stop rejecting upserts.
    pub fn heal(&self) {
        *self.fail_rule.lock().unwrap() = None;
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    /// Categories in the order upserts arrived.
    pub fn upsert_order(&self) -> Vec<Category> {
        self.order.lock().unwrap().clone()
    }

    /// Stored records of a category for an organization.
    pub fn records(&self, org: &str, category: Category) -> Vec<Payload> {
        let records = self.records.lock().unwrap();
        let mut found: Vec<_> = records
            .iter()
            .filter(|((o, c, _), _)| o == org && *c == category.collection())
            .map(|(_, r)| r.clone())
            .collect();
        found.sort_by_key(|r| r.get("barcode").map(|v| v.to_string()));
        found
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn latency(&self) -> Duration {
        *self.latency.lock().unwrap()
    }
}

fn barcode_of(record: &Payload) -> Option<&str> {
    record.get("barcode").and_then(Value::as_str)
}

impl RemoteStore for MockRemote {
    fn probe(&self) -> BoxFuture<'_, RemoteResult<()>> {
        Box::pin(async move {
            self.probe_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency()).await;
            if self.unreachable.load(Ordering::SeqCst) {
                return Err(RemoteError::ConnectionFailed("mock unreachable".into()));
            }
            Ok(())
        })
    }

    fn lookup_tenant(&self, token: &str) -> BoxFuture<'_, RemoteResult<Option<String>>> {
        let token = token.to_string();
        Box::pin(async move {
            tokio::time::sleep(self.latency()).await;
            if self.lookup_fails.load(Ordering::SeqCst) {
                return Err(RemoteError::ConnectionClosed);
            }
            Ok(self.tenants.lock().unwrap().get(&token).cloned())
        })
    }

    fn upsert(
        &self,
        category: Category,
        record: Payload,
    ) -> BoxFuture<'_, RemoteResult<DateTime<Utc>>> {
        Box::pin(async move {
            self.upsert_calls.fetch_add(1, Ordering::SeqCst);
            self.order.lock().unwrap().push(category);
            tokio::time::sleep(self.latency()).await;

            let barcode = barcode_of(&record).map(str::to_string);
            let hang = barcode.is_some() && *self.hang_on.lock().unwrap() == barcode;
            if hang {
                std::future::pending::<()>().await;
            }
            let explode = barcode.is_some() && *self.panic_on.lock().unwrap() == barcode;
            if explode {
                panic!("mock remote panicked");
            }
            if let Some(rule) = &*self.fail_rule.lock().unwrap() {
                if let Some(err) = rule(category, &record) {
                    return Err(err);
                }
            }

            let org = record
                .get(TENANT_FIELD)
                .and_then(Value::as_str)
                .ok_or_else(|| RemoteError::Rejected("missing organization_id".into()))?
                .to_string();
            let key = natural_key(category, &record)
                .map_err(|e| RemoteError::Rejected(e.to_string()))?;

            let now = Utc::now();
            let mut stored = record;
            stored.insert("updated_at".into(), Value::String(now.to_rfc3339()));
            self.records
                .lock()
                .unwrap()
                .insert((org, category.collection(), key), stored);
            Ok(now)
        })
    }
}
