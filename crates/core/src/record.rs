// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Preparing queued payloads for the remote store.
//!
//! Field clients have historically written scans with several spellings
//! (`bottle_barcode` vs `barcode`, `scan_type`/`action` vs `mode`, `in`/`out`
//! vs `RETURN`/`SHIP`). Records are normalized here so that the natural key
//! the remote upserts on is the same no matter which client wrote it.

use serde_json::Value;

use crate::category::Category;
use crate::error::{Error, Result};
use crate::op::{json_kind, PendingOperation, Payload};

/// Field carrying the tenant a record belongs to.
pub const TENANT_FIELD: &str = "organization_id";

/// Field the remote stamps with its own clock on every write.
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Separator between natural key components.
const KEY_SEPARATOR: char = '\u{1f}';

/// Builds the record sent to the remote for a queued operation.
///
/// The payload is normalized for its category, every natural key field is
/// checked, and the record is stamped with the tenant id. The local id is
/// never added to the record.
pub fn prepare_record(op: &PendingOperation, tenant_id: &str) -> Result<Payload> {
    let mut record = op.payload.clone();

    if op.category == Category::Scan {
        normalize_scan(&mut record, op);
    }

    // The remote owns this field; a client value would be overwritten anyway.
    record.remove(UPDATED_AT_FIELD);
    record.insert(
        TENANT_FIELD.to_string(),
        Value::String(tenant_id.to_string()),
    );

    natural_key(op.category, &record)?;
    Ok(record)
}

/// Checks that a raw payload value can be prepared at all.
pub fn validate_payload(category: Category, value: &Value) -> Result<()> {
    match value {
        Value::Object(map) if map.is_empty() => Err(Error::MalformedPayload(format!(
            "{} payload is empty",
            category
        ))),
        Value::Object(_) => Ok(()),
        other => Err(Error::MalformedPayload(format!(
            "expected a JSON object, got {}",
            json_kind(other)
        ))),
    }
}

/// Returns the natural key of a record as a single string.
///
/// Components are joined with an ASCII unit separator. String values are
/// used verbatim, other values by their JSON text.
pub fn natural_key(category: Category, record: &Payload) -> Result<String> {
    let mut key = String::new();
    for (i, field) in category.natural_key().iter().copied().enumerate() {
        let part = match record.get(field) {
            None | Some(Value::Null) => {
                return Err(Error::MissingNaturalKey {
                    category: category.as_str(),
                    field,
                })
            }
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        if i > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(&part);
    }
    Ok(key)
}

/// Maps a scan mode spelling onto the stored value.
pub fn normalize_scan_mode(mode: &str) -> String {
    match mode.trim().to_lowercase().as_str() {
        "out" => "SHIP".to_string(),
        "in" => "RETURN".to_string(),
        other => other.to_uppercase(),
    }
}

fn normalize_scan(record: &mut Payload, op: &PendingOperation) {
    if !has_value(record, "barcode") {
        if let Some(barcode) = record.get("bottle_barcode").cloned() {
            record.insert("barcode".to_string(), barcode);
        }
    }
    record.remove("bottle_barcode");

    let mode = ["mode", "scan_type", "action"]
        .iter()
        .find_map(|f| record.get(*f).and_then(Value::as_str).map(str::to_string));
    record.remove("scan_type");
    record.remove("action");
    if let Some(mode) = mode {
        record.insert("mode".to_string(), Value::String(normalize_scan_mode(&mode)));
    }

    if !has_value(record, "timestamp") {
        record.insert(
            "timestamp".to_string(),
            Value::String(op.created_at.to_rfc3339()),
        );
    }
    if !has_value(record, "order_number") {
        record.insert("order_number".to_string(), Value::String(String::new()));
    }
}

fn has_value(record: &Payload, field: &str) -> bool {
    !matches!(record.get(field), None | Some(Value::Null))
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
