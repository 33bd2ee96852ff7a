// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    customer = { "customer", Category::Customer },
    asset = { "asset", Category::Asset },
    cylinder_alias = { "cylinder", Category::Asset },
    bottles_alias = { "Bottles", Category::Asset },
    rental = { "rental", Category::Rental },
    scan_upper = { "SCAN", Category::Scan },
    fill_padded = { " fill ", Category::Fill },
)]
fn category_from_str_valid(input: &str, expected: Category) {
    assert_eq!(input.parse::<Category>().unwrap(), expected);
}

#[parameterized(
    unknown = { "invoice" },
    empty = { "" },
)]
fn category_from_str_invalid(input: &str) {
    assert!(input.parse::<Category>().is_err());
}

#[test]
fn drain_order_matches_rank() {
    for (i, category) in Category::DRAIN_ORDER.iter().enumerate() {
        assert_eq!(category.drain_rank(), i);
    }
}

#[test]
fn customers_drain_before_assets_and_assets_before_scans() {
    assert!(Category::Customer.drain_rank() < Category::Asset.drain_rank());
    assert!(Category::Asset.drain_rank() < Category::Rental.drain_rank());
    assert!(Category::Asset.drain_rank() < Category::Scan.drain_rank());
    assert!(Category::Asset.drain_rank() < Category::Fill.drain_rank());
}

#[parameterized(
    customer = { Category::Customer, "customers" },
    asset = { Category::Asset, "bottles" },
    rental = { Category::Rental, "rentals" },
    scan = { Category::Scan, "bottle_scans" },
    fill = { Category::Fill, "cylinder_fills" },
)]
fn collection_round_trips(category: Category, collection: &str) {
    assert_eq!(category.collection(), collection);
    assert_eq!(Category::from_collection(collection), Some(category));
}

#[test]
fn scan_natural_key_matches_dedup_index() {
    assert_eq!(
        Category::Scan.natural_key(),
        &["barcode", "order_number", "mode", "timestamp"]
    );
}

#[test]
fn serde_uses_snake_case() {
    let json = serde_json::to_string(&Category::Asset).unwrap();
    assert_eq!(json, "\"asset\"");
    let parsed: Category = serde_json::from_str("\"fill\"").unwrap();
    assert_eq!(parsed, Category::Fill);
}
