// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed record storage.
//!
//! Records are keyed by (organization, collection, natural key), so a record
//! written twice by a retrying client is stored once.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;

use fieldsync_core::record::{natural_key, normalize_scan_mode, TENANT_FIELD, UPDATED_AT_FIELD};
use fieldsync_core::{Category, Payload};

/// SQL schema for the record store.
pub const SCHEMA: &str = r#"
-- Session tokens and the organization they belong to
CREATE TABLE IF NOT EXISTS profiles (
    token TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL
);

-- One row per record, upserted on its natural key
CREATE TABLE IF NOT EXISTS records (
    organization_id TEXT NOT NULL,
    collection TEXT NOT NULL,
    natural_key TEXT NOT NULL,
    body TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (organization_id, collection, natural_key)
);

CREATE INDEX IF NOT EXISTS idx_records_collection ON records(organization_id, collection);
"#;

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The record cannot be stored; the client should keep it.
    #[error("{0}")]
    Rejected(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open the store at the given path, creating the schema if needed.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(RecordStore { conn })
    }

    /// Open an in-memory store (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(RecordStore { conn })
    }

    /// Register or move a session token.
    pub fn add_session(&self, token: &str, organization_id: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO profiles (token, organization_id) VALUES (?1, ?2)
             ON CONFLICT(token) DO UPDATE SET organization_id = excluded.organization_id",
            params![token, organization_id],
        )?;
        Ok(())
    }

    pub fn lookup_tenant(&self, token: &str) -> StoreResult<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT organization_id FROM profiles WHERE token = ?1",
                [token],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Insert or replace a record, stamping `updated_at` with the server clock.
    ///
    /// A scan with mode `RETURN` also marks the scanned asset empty, when
    /// the tenant has one.
    pub fn upsert(&mut self, category: Category, record: Payload) -> StoreResult<DateTime<Utc>> {
        let organization_id = record
            .get(TENANT_FIELD)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StoreError::Rejected(format!("record is missing {}", TENANT_FIELD)))?
            .to_string();
        let key =
            natural_key(category, &record).map_err(|e| StoreError::Rejected(e.to_string()))?;

        let now = Utc::now();
        let mut body = record;
        body.insert(UPDATED_AT_FIELD.to_string(), Value::String(now.to_rfc3339()));

        let tx = self.conn.transaction()?;
        put(&tx, &organization_id, category, &key, &body, now)?;
        if category == Category::Scan && is_return(&body) {
            mark_asset_empty(&tx, &organization_id, &body, now)?;
        }
        tx.commit()?;

        Ok(now)
    }

    /// Fetch one record by its natural key.
    #[cfg(test)]
    pub fn get(
        &self,
        organization_id: &str,
        category: Category,
        key: &str,
    ) -> StoreResult<Option<Payload>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM records
                 WHERE organization_id = ?1 AND collection = ?2 AND natural_key = ?3",
                params![organization_id, category.collection(), key],
                |row| row.get(0),
            )
            .optional()?;
        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    #[cfg(test)]
    pub fn count(&self, organization_id: &str, category: Category) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE organization_id = ?1 AND collection = ?2",
            params![organization_id, category.collection()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn put(
    conn: &Connection,
    organization_id: &str,
    category: Category,
    key: &str,
    body: &Payload,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO records (organization_id, collection, natural_key, body, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(organization_id, collection, natural_key)
         DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        params![
            organization_id,
            category.collection(),
            key,
            serde_json::to_string(body)?,
            now.to_rfc3339()
        ],
    )?;
    Ok(())
}

fn is_return(scan: &Payload) -> bool {
    scan.get("mode")
        .and_then(Value::as_str)
        .is_some_and(|mode| normalize_scan_mode(mode) == "RETURN")
}

fn mark_asset_empty(
    conn: &Connection,
    organization_id: &str,
    scan: &Payload,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    let Some(barcode) = scan.get("barcode") else {
        return Ok(());
    };
    let mut probe = Payload::new();
    probe.insert("barcode".to_string(), barcode.clone());
    let key = natural_key(Category::Asset, &probe).map_err(|e| StoreError::Rejected(e.to_string()))?;

    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM records
             WHERE organization_id = ?1 AND collection = ?2 AND natural_key = ?3",
            params![organization_id, Category::Asset.collection(), key],
            |row| row.get(0),
        )
        .optional()?;
    let Some(body) = body else {
        tracing::debug!(%key, "returned asset not on record");
        return Ok(());
    };

    let mut asset: Payload = serde_json::from_str(&body)?;
    asset.insert("status".to_string(), Value::String("empty".to_string()));
    asset.insert(UPDATED_AT_FIELD.to_string(), Value::String(now.to_rfc3339()));
    put(conn, organization_id, Category::Asset, &key, &asset, now)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
