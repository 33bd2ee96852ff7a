// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde::Serialize;
use serde_json::Value;

use fieldsync_core::{Category, ItemError, LastSync, SyncResult, SyncStatus};

use crate::colors;
use crate::queue::QueueEntry;

/// JSON form of a queue entry in `pending -o json`.
#[derive(Debug, Serialize)]
pub struct PendingJson {
    pub local_id: String,
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&QueueEntry> for PendingJson {
    fn from(entry: &QueueEntry) -> Self {
        match entry {
            QueueEntry::Pending(op) => PendingJson {
                local_id: op.local_id.to_string(),
                category: Some(op.category),
                created_at: Some(op.created_at.to_rfc3339()),
                payload: Some(Value::Object(op.payload.clone())),
                error: None,
            },
            QueueEntry::Malformed(m) => PendingJson {
                local_id: m.local_id.to_string(),
                category: m.category,
                created_at: None,
                payload: None,
                error: Some(m.reason.clone()),
            },
        }
    }
}

/// One line per queue entry.
pub fn format_entry(entry: &QueueEntry) -> String {
    match entry {
        QueueEntry::Pending(op) => format!(
            "{}  {:<8}  {}  {}",
            op.local_id,
            op.category.as_str(),
            op.created_at.format("%Y-%m-%d %H:%M:%S"),
            Value::Object(op.payload.clone())
        ),
        QueueEntry::Malformed(m) => format!(
            "{}  {:<8}  {}",
            m.local_id,
            m.category.map_or("?", |c| c.as_str()),
            colors::state(false, &format!("malformed: {}", m.reason))
        ),
    }
}

fn format_item_error(err: &ItemError) -> String {
    let category = err.category.map_or("?", |c| c.as_str());
    format!("  {} ({}): {}", err.local_id, category, err.message)
}

/// Summary line followed by one line per failed item.
pub fn format_sync_result(result: &SyncResult) -> String {
    let mut out = colors::state(result.success, &result.message);
    for err in &result.item_errors {
        out.push('\n');
        out.push_str(&format_item_error(err));
    }
    out
}

pub fn format_last_sync(last: &LastSync) -> String {
    match last {
        LastSync::Never => LastSync::NEVER.to_string(),
        LastSync::At(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    }
}

/// Multi-line status block.
pub fn format_status(status: &SyncStatus) -> String {
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    let last = format_last_sync(&status.last_sync_time);
    [
        format!(
            "{} {}",
            colors::header("Online:   "),
            colors::state(status.is_online, yes_no(status.is_online))
        ),
        format!(
            "{} {}",
            colors::header("Pending:  "),
            match (status.pending(), &status.queue_error) {
                (Some(n), _) => colors::state(n == 0, &n.to_string()),
                (None, error) => colors::state(
                    false,
                    &format!("unknown (queue unreadable: {})", error.as_deref().unwrap_or("")),
                ),
            }
        ),
        format!(
            "{} {}",
            colors::header("Last sync:"),
            if status.last_sync_time == LastSync::Never {
                colors::context(&last)
            } else {
                last
            }
        ),
        format!("{} {}", colors::header("Syncing:  "), yes_no(status.is_syncing)),
    ]
    .join("\n")
}

/// Single-line status for `watch`.
pub fn format_status_line(status: &SyncStatus) -> String {
    format!(
        "{} | {} pending | last sync {}{}",
        if status.is_online { "online" } else { "offline" },
        status
            .pending()
            .map_or_else(|| "?".to_string(), |n| n.to_string()),
        format_last_sync(&status.last_sync_time),
        if status.is_syncing { " | syncing" } else { "" }
    )
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
