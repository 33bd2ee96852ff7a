// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Outcomes of drain attempts and the status snapshot shown to users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::category::Category;
use crate::op::LocalId;

/// Message returned when a drain is rejected by the single-flight guard.
pub const ALREADY_IN_PROGRESS: &str = "sync already in progress";

/// Message returned when no tenant could be resolved.
pub const NO_TENANT: &str = "Sync skipped: no tenant context";

/// How a drain attempt ended.
///
/// Distinguishes attempts that could not run at all from attempts that ran
/// and had item failures, so callers can alert on connectivity separately
/// from bad records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// The queue was iterated; see item errors for per-record failures.
    Completed,
    /// Another drain was running; this call did nothing.
    AlreadyInProgress,
    /// Preflight failed; the queue was not touched.
    Offline,
    /// No authenticated tenant; nothing to sync for this client.
    NoTenant,
    /// The local queue could not be read or rewritten.
    StorageFailed,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Completed => "completed",
            Disposition::AlreadyInProgress => "already_in_progress",
            Disposition::Offline => "offline",
            Disposition::NoTenant => "no_tenant",
            Disposition::StorageFailed => "storage_failed",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A queued operation the remote did not accept during a drain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    /// Category of the entry, absent when the line could not be parsed at all.
    pub category: Option<Category>,
    pub local_id: LocalId,
    pub message: String,
}

/// Result of one drain attempt. Built fresh per call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    pub disposition: Disposition,
    pub message: String,
    pub synced_item_count: usize,
    pub item_errors: Vec<ItemError>,
}

impl SyncResult {
    /// A drain that did not run because another one holds the guard.
    pub fn already_in_progress() -> Self {
        SyncResult {
            success: false,
            disposition: Disposition::AlreadyInProgress,
            message: ALREADY_IN_PROGRESS.to_string(),
            synced_item_count: 0,
            item_errors: Vec::new(),
        }
    }

    /// A drain stopped by preflight.
    pub fn offline(reason: impl Into<String>) -> Self {
        SyncResult {
            success: false,
            disposition: Disposition::Offline,
            message: reason.into(),
            synced_item_count: 0,
            item_errors: Vec::new(),
        }
    }

    /// A drain skipped because the client has no tenant.
    pub fn no_tenant() -> Self {
        SyncResult {
            success: true,
            disposition: Disposition::NoTenant,
            message: NO_TENANT.to_string(),
            synced_item_count: 0,
            item_errors: Vec::new(),
        }
    }

    /// A drain that could not read or rewrite the local queue.
    pub fn storage_failed(reason: impl Into<String>, item_errors: Vec<ItemError>) -> Self {
        SyncResult {
            success: false,
            disposition: Disposition::StorageFailed,
            message: reason.into(),
            synced_item_count: 0,
            item_errors,
        }
    }

    /// A drain that iterated every queued entry.
    ///
    /// The attempt counts as a success unless it had entries and every one
    /// of them failed.
    pub fn completed(synced: usize, item_errors: Vec<ItemError>) -> Self {
        let failed = item_errors.len();
        let message = match (synced, failed) {
            (0, 0) => "No offline data to sync".to_string(),
            (n, 0) => format!("Successfully synced {} items", n),
            (n, m) => format!("Synced {} items, {} failed (will retry)", n, m),
        };
        SyncResult {
            success: synced > 0 || failed == 0,
            disposition: Disposition::Completed,
            message,
            synced_item_count: synced,
            item_errors,
        }
    }

    /// Number of entries that stayed queued because they failed.
    pub fn failed_item_count(&self) -> usize {
        self.item_errors.len()
    }
}

/// When the client last pushed at least one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum LastSync {
    #[default]
    Never,
    At(DateTime<Utc>),
}

impl LastSync {
    /// Sentinel shown when no sync has happened yet.
    pub const NEVER: &'static str = "Never";

    /// Parses the persisted form, treating anything unreadable as never.
    pub fn parse_lenient(s: &str) -> Self {
        LastSync::try_from(s.to_string()).unwrap_or_default()
    }
}

impl fmt::Display for LastSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastSync::Never => f.write_str(Self::NEVER),
            LastSync::At(at) => f.write_str(&at.to_rfc3339()),
        }
    }
}

impl From<LastSync> for String {
    fn from(last: LastSync) -> Self {
        last.to_string()
    }
}

impl TryFrom<String> for LastSync {
    type Error = chrono::ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s == Self::NEVER {
            return Ok(LastSync::Never);
        }
        let at = DateTime::parse_from_rfc3339(&s)?;
        Ok(LastSync::At(at.with_timezone(&Utc)))
    }
}

/// Snapshot of the engine as shown to the rest of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub is_online: bool,
    /// Queued lines. Zero and meaningless when `queue_error` is set.
    pub pending_count: usize,
    pub last_sync_time: LastSync,
    pub is_syncing: bool,
    /// Why the queue could not be read, if it could not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_error: Option<String>,
}

impl SyncStatus {
    /// Pending count, or `None` when the queue could not be read.
    pub fn pending(&self) -> Option<usize> {
        match self.queue_error {
            Some(_) => None,
            None => Some(self.pending_count),
        }
    }
}

impl Default for SyncStatus {
    fn default() -> Self {
        SyncStatus {
            is_online: false,
            pending_count: 0,
            last_sync_time: LastSync::Never,
            is_syncing: false,
            queue_error: None,
        }
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
