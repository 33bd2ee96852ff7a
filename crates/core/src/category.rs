// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Record categories captured in the field.
//!
//! A category decides which remote collection a queued operation lands in,
//! which payload fields form its natural (idempotency) key, and where it sits
//! in the drain order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Kind of record a pending operation mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// A customer account.
    Customer,
    /// A tracked cylinder (bottle).
    Asset,
    /// A cylinder rented to a customer.
    Rental,
    /// A barcode scan (ship/return) recorded in the field.
    Scan,
    /// A cylinder fill.
    Fill,
}

impl Category {
    /// Categories in the order a drain applies them.
    ///
    /// Referenced records go first: customers before the assets and rentals
    /// that point at them, assets before the fills and scans of those assets.
    pub const DRAIN_ORDER: [Category; 5] = [
        Category::Customer,
        Category::Asset,
        Category::Rental,
        Category::Fill,
        Category::Scan,
    ];

    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Customer => "customer",
            Category::Asset => "asset",
            Category::Rental => "rental",
            Category::Scan => "scan",
            Category::Fill => "fill",
        }
    }

    /// Remote collection the category is upserted into.
    pub fn collection(&self) -> &'static str {
        match self {
            Category::Customer => "customers",
            Category::Asset => "bottles",
            Category::Rental => "rentals",
            Category::Scan => "bottle_scans",
            Category::Fill => "cylinder_fills",
        }
    }

    /// Payload fields that identify a record within a tenant.
    ///
    /// The remote store upserts on these, so applying the same payload
    /// twice leaves a single record.
    pub fn natural_key(&self) -> &'static [&'static str] {
        match self {
            Category::Customer => &["customer_id"],
            Category::Asset => &["barcode"],
            Category::Rental => &["customer_id", "barcode", "start_date"],
            Category::Scan => &["barcode", "order_number", "mode", "timestamp"],
            Category::Fill => &["barcode", "filled_at"],
        }
    }

    /// Position of this category in [`Category::DRAIN_ORDER`].
    pub fn drain_rank(&self) -> usize {
        match self {
            Category::Customer => 0,
            Category::Asset => 1,
            Category::Rental => 2,
            Category::Fill => 3,
            Category::Scan => 4,
        }
    }

    /// Looks a category up by its remote collection name.
    pub fn from_collection(collection: &str) -> Option<Category> {
        Category::DRAIN_ORDER
            .into_iter()
            .find(|c| c.collection() == collection)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "customer" | "customers" => Ok(Category::Customer),
            "asset" | "assets" | "cylinder" | "cylinders" | "bottle" | "bottles" => {
                Ok(Category::Asset)
            }
            "rental" | "rentals" => Ok(Category::Rental),
            "scan" | "scans" => Ok(Category::Scan),
            "fill" | "fills" => Ok(Category::Fill),
            _ => Err(Error::InvalidCategory(s.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "category_tests.rs"]
mod tests;
