// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Wraps the record store for shared access across connections.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use fieldsync_core::{Category, Payload};

use crate::store::{RecordStore, StoreResult};

/// File name of the record database inside the data directory.
pub const DB_FILE_NAME: &str = "records.db";

/// Shared server state containing the record store.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    store: Mutex<RecordStore>,
}

impl ServerState {
    /// Opens the record store in the given directory.
    pub fn new(data_dir: &Path) -> StoreResult<Self> {
        let store = RecordStore::open(&data_dir.join(DB_FILE_NAME))?;
        Ok(Self::from_store(store))
    }

    pub fn from_store(store: RecordStore) -> Self {
        ServerState {
            inner: Arc::new(ServerStateInner {
                store: Mutex::new(store),
            }),
        }
    }

    pub async fn add_session(&self, token: &str, organization_id: &str) -> StoreResult<()> {
        let store = self.inner.store.lock().await;
        store.add_session(token, organization_id)
    }

    /// Resolves a session token to its organization.
    pub async fn lookup_tenant(&self, token: &str) -> StoreResult<Option<String>> {
        let store = self.inner.store.lock().await;
        store.lookup_tenant(token)
    }

    pub async fn upsert(&self, category: Category, record: Payload) -> StoreResult<DateTime<Utc>> {
        let mut store = self.inner.store.lock().await;
        store.upsert(category, record)
    }

    #[cfg(test)]
    pub async fn get(
        &self,
        organization_id: &str,
        category: Category,
        key: &str,
    ) -> StoreResult<Option<Payload>> {
        let store = self.inner.store.lock().await;
        store.get(organization_id, category, key)
    }

    #[cfg(test)]
    pub async fn count(&self, organization_id: &str, category: Category) -> StoreResult<usize> {
        let store = self.inner.store.lock().await;
        store.count(organization_id, category)
    }
}
