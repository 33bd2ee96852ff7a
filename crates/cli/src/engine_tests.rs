// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::test_helpers::{make_input, wait_until, FakeNetwork, MockRemote};
use fieldsync_core::{Category, LastSync};
use serde_json::json;
use std::time::Duration;

fn engine(dir: &Path, network: Arc<FakeNetwork>, remote: Arc<MockRemote>) -> Engine {
    let mut config = Config::default();
    config.sync.monitor_tick_ms = 10;
    config.sync.refresh_interval_secs = 1;
    Engine::with_parts(dir, config, network, remote).unwrap()
}

#[tokio::test]
async fn engine_uses_data_dir_files() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path(), FakeNetwork::online(), Arc::new(MockRemote::default()));

    assert_eq!(engine.queue.path(), dir.path().join(OfflineQueue::FILE_NAME));
    assert_eq!(engine.prefs.path(), dir.path().join(Prefs::FILE_NAME));
    assert!(engine.prefs.auto_sync());
}

#[tokio::test]
async fn auto_sync_default_comes_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.sync.auto_sync_default = false;
    let engine = Engine::with_parts(
        dir.path(),
        config,
        FakeNetwork::online(),
        Arc::new(MockRemote::default()),
    )
    .unwrap();

    assert!(!engine.prefs.auto_sync());
}

#[tokio::test]
async fn started_engine_drains_when_connection_returns() {
    let dir = tempfile::tempdir().unwrap();
    let network = FakeNetwork::offline();
    let remote = MockRemote::with_session("tok", "org-1");
    let engine = engine(dir.path(), network.clone(), remote.clone());
    engine.prefs.set_session_token(Some("tok")).unwrap();
    engine
        .queue
        .enqueue(make_input(Category::Asset, json!({"barcode": "A1"})))
        .unwrap();

    let cancel = CancellationToken::new();
    let refresh = engine.start(cancel.clone());
    let mut sub = engine.monitor.subscribe();
    // Let the monitor seed its offline baseline before coming back online
    tokio::time::sleep(Duration::from_millis(30)).await;
    network.set_online(true);
    tokio::time::timeout(Duration::from_secs(2), sub.changed())
        .await
        .unwrap();

    let queue = engine.queue.clone();
    assert!(wait_until(|| queue.count().unwrap() == 0).await);
    assert_eq!(remote.record_count(), 1);

    let status = engine.status.watch();
    assert!(wait_until(|| matches!(status.borrow().last_sync_time, LastSync::At(_))).await);

    cancel.cancel();
    refresh.await.unwrap();
    engine.stop().await;
    assert!(!engine.monitor.is_running());
}
