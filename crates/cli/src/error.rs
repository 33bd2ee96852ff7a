// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::prefs::PrefsError;
use crate::queue::QueueError;
use crate::transport::RemoteError;

/// All possible errors that can occur in the fieldsync client.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'fieldsync init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("invalid payload JSON: {0}\n  hint: pass a JSON object, e.g. '{{\"barcode\":\"A1\"}}'")]
    InvalidPayload(String),

    #[error("sync did not complete: {0}")]
    SyncFailed(String),

    #[error("queue error: {0}\n  hint: the operation was NOT saved")]
    Queue(#[from] QueueError),

    #[error("preferences error: {0}")]
    Prefs(#[from] PrefsError),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Core(#[from] fieldsync_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

/// A specialized Result type for fieldsync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
