// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline queue for persisting operations while disconnected.
//!
//! Uses JSONL format for durability - each operation is written as a single line
//! and fsynced immediately. A torn tail left by an interrupted write is closed
//! off before the next append, so it can never swallow a later operation.
//! Lines are read as raw bytes; a line that is not valid UTF-8 is reported as
//! malformed and kept like any other unreadable line. A drain removes confirmed operations by rewriting the
//! surviving lines verbatim into a temp file that atomically replaces the queue,
//! so a failed removal leaves the previous file intact.
//!
//! Writers from other processes (e.g. `fieldsync enqueue` while `fieldsync watch`
//! drains) are excluded with an advisory lock on a sidecar lock file; within a
//! process a mutex serializes access so readers never see a half-removed batch.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde_json::Value;

use fieldsync_core::record::validate_payload;
use fieldsync_core::{Category, LocalId, PendingOperation, PendingOperationInput};

/// Error type for queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The advisory lock on the queue could not be taken.
    #[error("queue lock failed: {0}")]
    Lock(std::io::Error),
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// A queue line that cannot be applied as-is.
///
/// Kept in the queue untouched so an operator can inspect it.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedEntry {
    /// The entry's local id, or a synthetic `line-N` id when none could be read.
    pub local_id: LocalId,
    pub category: Option<Category>,
    pub reason: String,
}

/// One line of the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEntry {
    Pending(PendingOperation),
    Malformed(MalformedEntry),
}

impl QueueEntry {
    pub fn local_id(&self) -> &LocalId {
        match self {
            QueueEntry::Pending(op) => &op.local_id,
            QueueEntry::Malformed(m) => &m.local_id,
        }
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            QueueEntry::Pending(op) => Some(op.category),
            QueueEntry::Malformed(m) => m.category,
        }
    }
}

/// Offline queue for persisting operations.
///
/// Operations are stored in a JSONL file, one operation per line.
/// Each write is fsynced to ensure durability.
pub struct OfflineQueue {
    /// Path to the queue file.
    path: PathBuf,
    /// Path to the sidecar advisory lock file.
    lock_path: PathBuf,
    /// Serializes access from tasks within this process.
    guard: Mutex<()>,
}

impl OfflineQueue {
    /// Queue filename within the data directory.
    pub const FILE_NAME: &'static str = "sync_queue.jsonl";

    /// Create or open an offline queue at the given path.
    pub fn open(path: &Path) -> QueueResult<Self> {
        // Ensure the file exists (create if not)
        OpenOptions::new().create(true).append(true).open(path)?;

        let mut lock_name = path.as_os_str().to_owned();
        lock_name.push(".lock");

        Ok(OfflineQueue {
            path: path.to_path_buf(),
            lock_path: PathBuf::from(lock_name),
            guard: Mutex::new(()),
        })
    }

    /// Path to the queue file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Enqueue an operation for later sending.
    ///
    /// The operation is stamped with a fresh local id and creation time and
    /// immediately persisted to disk. An error means the operation was NOT
    /// stored and must be reported to the user.
    pub fn enqueue(&self, input: PendingOperationInput) -> QueueResult<PendingOperation> {
        self.enqueue_at(input, Utc::now())
    }

    /// Enqueue with an explicit creation time.
    pub fn enqueue_at(
        &self,
        input: PendingOperationInput,
        now: DateTime<Utc>,
    ) -> QueueResult<PendingOperation> {
        let op = PendingOperation::new(input, now);
        let json = serde_json::to_string(&op)?;

        let _guard = self.lock_in_process();
        let _lock = self.lock_exclusive()?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        let mut record = Vec::with_capacity(json.len() + 2);
        if ends_torn(&mut file)? {
            tracing::warn!(
                path = %self.path.display(),
                "queue ends in a partial line, closing it off"
            );
            record.push(b'\n');
        }
        record.extend_from_slice(json.as_bytes());
        record.push(b'\n');
        file.write_all(&record)?;
        file.sync_all()?;

        tracing::debug!(local_id = %op.local_id, category = %op.category, "enqueued operation");
        Ok(op)
    }

    /// Read queued entries in insertion order without removing them.
    ///
    /// With a category, only entries of that category are returned; malformed
    /// lines without a readable category are then left out.
    pub fn list_pending(&self, category: Option<Category>) -> QueueResult<Vec<QueueEntry>> {
        let lines = {
            let _guard = self.lock_in_process();
            let _lock = self.lock_shared()?;
            self.read_lines()?
        };

        let entries = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !is_blank(line))
            .map(|(n, line)| parse_entry(n + 1, line))
            .filter(|entry| category.is_none() || entry.category() == category)
            .collect();
        Ok(entries)
    }

    /// Read only the well-formed operations, in insertion order.
    pub fn peek_all(&self) -> QueueResult<Vec<PendingOperation>> {
        Ok(self
            .list_pending(None)?
            .into_iter()
            .filter_map(|entry| match entry {
                QueueEntry::Pending(op) => Some(op),
                QueueEntry::Malformed(_) => None,
            })
            .collect())
    }

    /// Remove the given operations from the queue.
    ///
    /// All-or-nothing: the surviving lines are written to a temp file that
    /// replaces the queue in one rename. If any step fails the queue is left
    /// as it was. Lines without a readable local id are never removed.
    /// Returns how many lines were removed.
    pub fn remove(&self, local_ids: &HashSet<LocalId>) -> QueueResult<usize> {
        if local_ids.is_empty() {
            return Ok(0);
        }

        let _guard = self.lock_in_process();
        let _lock = self.lock_exclusive()?;

        let lines = self.read_lines()?;
        let mut kept = Vec::with_capacity(lines.len());
        let mut removed = 0;
        for line in lines {
            if is_blank(&line) {
                continue;
            }
            match line_local_id(&line) {
                Some(id) if local_ids.contains(&id) => removed += 1,
                _ => kept.push(line),
            }
        }

        if removed == 0 {
            return Ok(0);
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let write_result = (|| -> std::io::Result<()> {
            let mut file = File::create(&tmp_path)?;
            for line in &kept {
                file.write_all(line)?;
                file.write_all(b"\n")?;
            }
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        })();

        if let Err(e) = write_result {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        Ok(removed)
    }

    /// Get the number of queued operations.
    ///
    /// Counts non-blank lines without deserializing payloads.
    pub fn count(&self) -> QueueResult<usize> {
        let _guard = self.lock_in_process();
        let _lock = self.lock_shared()?;
        Ok(self
            .read_lines()?
            .iter()
            .filter(|line| !is_blank(line))
            .count())
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.count()? == 0)
    }

    /// Raw lines of the queue file, without their terminators.
    fn read_lines(&self) -> QueueResult<Vec<Vec<u8>>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut lines: Vec<Vec<u8>> = bytes.split(|b| *b == b'\n').map(<[u8]>::to_vec).collect();
        // A terminated file ends with an empty piece
        if lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        Ok(lines)
    }

    fn lock_in_process(&self) -> MutexGuard<'_, ()> {
        // The mutex guards no data, so a poisoned lock is still usable.
        self.guard.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn open_lock_file(&self) -> std::io::Result<File> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
    }

    fn lock_exclusive(&self) -> QueueResult<File> {
        let file = self.open_lock_file().map_err(QueueError::Lock)?;
        file.lock_exclusive().map_err(QueueError::Lock)?;
        Ok(file)
    }

    fn lock_shared(&self) -> QueueResult<File> {
        let file = self.open_lock_file().map_err(QueueError::Lock)?;
        file.lock_shared().map_err(QueueError::Lock)?;
        Ok(file)
    }
}

/// Whether the file is non-empty and its last byte is not a newline.
fn ends_torn(file: &mut File) -> std::io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Reads just the local id of a line, if it has one.
fn line_local_id(line: &[u8]) -> Option<LocalId> {
    let value: Value = serde_json::from_slice(line).ok()?;
    let id = value.get("local_id")?.as_str()?;
    id.parse().ok()
}

/// Parses one queue line, classifying anything unusable as malformed.
fn parse_entry(line_no: usize, raw: &[u8]) -> QueueEntry {
    let synthetic = || LocalId::from(format!("line-{}", line_no).as_str());

    let line = match std::str::from_utf8(raw) {
        Ok(line) => line,
        Err(e) => {
            return QueueEntry::Malformed(MalformedEntry {
                local_id: synthetic(),
                category: None,
                reason: format!("queue line is not valid UTF-8: {}", e),
            })
        }
    };

    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            return QueueEntry::Malformed(MalformedEntry {
                local_id: synthetic(),
                category: None,
                reason: format!("unparseable queue line: {}", e),
            })
        }
    };

    let local_id = match line_local_id(raw) {
        Some(id) => id,
        None => {
            return QueueEntry::Malformed(MalformedEntry {
                local_id: synthetic(),
                category: None,
                reason: "queue line has no local_id".to_string(),
            })
        }
    };

    let category = value
        .get("category")
        .and_then(Value::as_str)
        .and_then(|c| c.parse::<Category>().ok());
    let Some(category) = category else {
        return QueueEntry::Malformed(MalformedEntry {
            local_id,
            category: None,
            reason: "queue line has no valid category".to_string(),
        });
    };

    let payload = value.get("payload").cloned().unwrap_or(Value::Null);
    if let Err(e) = validate_payload(category, &payload) {
        return QueueEntry::Malformed(MalformedEntry {
            local_id,
            category: Some(category),
            reason: e.to_string(),
        });
    }

    match serde_json::from_value::<PendingOperation>(value) {
        Ok(op) => QueueEntry::Pending(op),
        Err(e) => QueueEntry::Malformed(MalformedEntry {
            local_id,
            category: Some(category),
            reason: format!("invalid queue entry: {}", e),
        }),
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
