// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! The variable name constants are generated by `build.rs` and live in the
//! [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `FIELDSYNC_DIR` if set and non-empty.
pub fn data_dir() -> Option<PathBuf> {
    std::env::var(vars::FIELDSYNC_DIR)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Returns `true` if `FIELDSYNC_LOG=stderr`.
pub fn log_to_stderr() -> bool {
    std::env::var(vars::FIELDSYNC_LOG).is_ok_and(|v| v == "stderr")
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
