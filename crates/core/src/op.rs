// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending operations captured while offline.
//!
//! Every mutation recorded in the field becomes a [`PendingOperation`]. It is
//! identified locally by a time-based [`LocalId`] that only serves queue
//! bookkeeping; the remote store identifies records by their natural key.
//! Operations are never edited after they are queued: they are either
//! removed once the remote confirms them or left untouched for a retry.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::category::Category;
use crate::error::{Error, Result};

/// Field name to value mapping carried by an operation.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Per-process counter mixed into generated ids.
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Client-generated identifier of a queued operation.
///
/// Format: `{unix_millis}-{hash}` where hash is the first 8 hex chars of
/// SHA256 over the timestamp, process id and a per-process counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(String);

impl LocalId {
    /// Generates a fresh id for an operation created at `now`.
    pub fn generate(now: &DateTime<Utc>) -> Self {
        let seq = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let input = format!(
            "{}:{}:{}",
            now.timestamp_nanos_opt().unwrap_or_default(),
            std::process::id(),
            seq
        );
        let hash = Sha256::digest(input.as_bytes());
        LocalId(format!(
            "{}-{}",
            now.timestamp_millis(),
            hex::encode(&hash[..4])
        ))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LocalId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(Error::InvalidLocalId(s.to_string()));
        }
        Ok(LocalId(s.to_string()))
    }
}

impl From<&str> for LocalId {
    fn from(s: &str) -> Self {
        LocalId(s.to_string())
    }
}

/// What a caller hands to the queue: a category and its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOperationInput {
    pub category: Category,
    pub payload: Payload,
}

impl PendingOperationInput {
    /// Creates an input from a category and payload object.
    pub fn new(category: Category, payload: Payload) -> Self {
        PendingOperationInput { category, payload }
    }

    /// Creates an input from any JSON value, rejecting non-objects.
    pub fn from_value(category: Category, value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(payload) => Ok(PendingOperationInput { category, payload }),
            other => Err(Error::MalformedPayload(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

/// One queued mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub local_id: LocalId,
    pub category: Category,
    pub payload: Payload,
    pub created_at: DateTime<Utc>,
}

impl PendingOperation {
    /// Stamps an input with a fresh local id and creation time.
    pub fn new(input: PendingOperationInput, now: DateTime<Utc>) -> Self {
        PendingOperation {
            local_id: LocalId::generate(&now),
            category: input.category,
            payload: input.payload,
            created_at: now,
        }
    }
}

/// Human name of a JSON value's kind, for error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
