// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for fieldsync-core operations.

use thiserror::Error;

/// All possible errors that can occur in fieldsync-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid category: '{0}'\n  hint: valid categories are: customer, asset, rental, scan, fill")]
    InvalidCategory(String),

    #[error("invalid transport type: '{0}'\n  hint: valid types are: wifi, cellular, ethernet, unknown")]
    InvalidTransport(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("{category} record is missing natural key field '{field}'")]
    MissingNaturalKey {
        category: &'static str,
        field: &'static str,
    },

    #[error("invalid local id: '{0}'")]
    InvalidLocalId(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for fieldsync-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
