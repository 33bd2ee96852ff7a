// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Log setup for the client binary.

use std::fs;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::config::LOG_FILE_NAME;

/// Install the global subscriber.
///
/// Logs go to `fieldsync.log` in the data directory, or to stderr when the
/// file cannot be opened or `FIELDSYNC_LOG=stderr`. `RUST_LOG` selects the
/// level, `info` by default. A second call is a no-op.
pub fn init(data_dir: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file = if crate::env::log_to_stderr() {
        None
    } else {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(data_dir.join(LOG_FILE_NAME))
            .ok()
    };

    let _ = match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .try_init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
}
