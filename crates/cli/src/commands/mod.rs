// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod auto_sync;
pub mod enqueue;
pub mod init;
pub mod pending;
pub mod session;
pub mod status;
pub mod sync;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{find_data_dir, Config};
use crate::engine::Engine;
use crate::error::Result;
use crate::prefs::Prefs;
use crate::queue::OfflineQueue;

/// Data directory and config of the current context, with logging set up.
pub fn open_context() -> Result<(PathBuf, Config)> {
    let data_dir = find_data_dir()?;
    let config = Config::load(&data_dir)?;
    crate::logging::init(&data_dir);
    Ok((data_dir, config))
}

/// Helper to open the full engine from the current context.
pub fn open_engine() -> Result<Engine> {
    let (data_dir, config) = open_context()?;
    Engine::open(&data_dir, config)
}

/// Helper to open just the queue from the current context.
pub fn open_queue() -> Result<OfflineQueue> {
    let (data_dir, _) = open_context()?;
    Ok(OfflineQueue::open(&data_dir.join(OfflineQueue::FILE_NAME))?)
}

/// Helper to open just the preferences from the current context.
pub fn open_prefs() -> Result<Arc<Prefs>> {
    let (data_dir, config) = open_context()?;
    Ok(Arc::new(Prefs::new(
        &data_dir.join(Prefs::FILE_NAME),
        config.sync.auto_sync_default,
    )))
}
