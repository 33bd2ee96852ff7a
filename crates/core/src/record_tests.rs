// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::op::PendingOperationInput;
use chrono::{TimeZone, Utc};
use serde_json::json;
use yare::parameterized;

fn op(category: Category, payload: Value) -> PendingOperation {
    let now = Utc.with_ymd_and_hms(2026, 5, 4, 8, 30, 0).unwrap();
    PendingOperation::new(
        PendingOperationInput::from_value(category, payload).unwrap(),
        now,
    )
}

#[parameterized(
    out = { "out", "SHIP" },
    in_ = { "in", "RETURN" },
    upper_in = { "IN", "RETURN" },
    ship = { "ship", "SHIP" },
    fill = { "Fill", "FILL" },
)]
fn scan_mode_normalization(input: &str, expected: &str) {
    assert_eq!(normalize_scan_mode(input), expected);
}

#[test]
fn scan_aliases_are_normalized() {
    let op = op(
        Category::Scan,
        json!({"bottle_barcode": "TEST123", "scan_type": "out", "order_number": "ORDER001"}),
    );
    let record = prepare_record(&op, "org-1").unwrap();

    assert_eq!(record["barcode"], "TEST123");
    assert_eq!(record["mode"], "SHIP");
    assert_eq!(record["organization_id"], "org-1");
    assert_eq!(record["timestamp"], "2026-05-04T08:30:00+00:00");
    assert!(!record.contains_key("bottle_barcode"));
    assert!(!record.contains_key("scan_type"));
}

#[test]
fn scan_without_order_number_gets_empty_one() {
    let op = op(
        Category::Scan,
        json!({"barcode": "B1", "mode": "in", "timestamp": "t1"}),
    );
    let record = prepare_record(&op, "org").unwrap();
    assert_eq!(record["order_number"], "");
    assert_eq!(record["mode"], "RETURN");
    assert_eq!(record["timestamp"], "t1");
}

#[test]
fn scan_without_mode_is_rejected() {
    let op = op(Category::Scan, json!({"barcode": "B1"}));
    let err = prepare_record(&op, "org").unwrap_err();
    assert!(matches!(
        err,
        Error::MissingNaturalKey {
            category: "scan",
            field: "mode"
        }
    ));
}

#[test]
fn tenant_stamp_overrides_payload_value() {
    let op = op(
        Category::Customer,
        json!({"customer_id": "C1", "organization_id": "someone-else", "updated_at": "x"}),
    );
    let record = prepare_record(&op, "org-1").unwrap();
    assert_eq!(record["organization_id"], "org-1");
    assert!(!record.contains_key("updated_at"));
}

#[test]
fn local_id_is_never_part_of_record() {
    let op = op(Category::Asset, json!({"barcode": "B9"}));
    let record = prepare_record(&op, "org").unwrap();
    assert!(record
        .values()
        .all(|v| v.as_str() != Some(op.local_id.as_str())));
}

#[test]
fn null_natural_key_counts_as_missing() {
    let op = op(Category::Asset, json!({"barcode": null, "status": "full"}));
    assert!(prepare_record(&op, "org").is_err());
}

#[test]
fn natural_key_joins_components() {
    let record: Payload = serde_json::from_value(json!({
        "customer_id": "C1", "barcode": "B1", "start_date": "2026-01-01"
    }))
    .unwrap();
    let key = natural_key(Category::Rental, &record).unwrap();
    assert_eq!(key, "C1\u{1f}B1\u{1f}2026-01-01");
}

#[test]
fn natural_key_uses_json_text_for_numbers() {
    let record: Payload = serde_json::from_value(json!({"customer_id": 42})).unwrap();
    assert_eq!(natural_key(Category::Customer, &record).unwrap(), "42");
}

#[test]
fn validate_payload_rejects_non_objects_and_empty() {
    assert!(validate_payload(Category::Scan, &json!({"barcode": "x"})).is_ok());
    assert!(validate_payload(Category::Scan, &json!({})).is_err());
    assert!(validate_payload(Category::Scan, &json!("text")).is_err());
}
