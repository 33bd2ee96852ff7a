// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fieldsync - Offline-first capture and sync of field records.
//!
//! Records captured while disconnected are appended to a durable local
//! queue and pushed to the remote store once the device is online again.
//!
//! # Main Components
//!
//! - [`OfflineQueue`] - Durable JSONL queue of pending operations
//! - [`ConnectivityMonitor`] - Edge-detecting network watcher with a restoration hook
//! - [`SyncCoordinator`] - Single-flight drain of the queue against a [`RemoteStore`]
//! - [`StatusFacade`] - Composed [`SyncStatus`](fieldsync_core::SyncStatus) snapshots
//!
//! # Wiring
//!
//! ```rust,ignore
//! use fieldsync::{find_data_dir, Config, Engine};
//!
//! let data_dir = find_data_dir()?;
//! let engine = Engine::open(&data_dir, Config::load(&data_dir)?)?;
//! let result = engine.status.trigger_manual_sync().await;
//! ```

mod cli;
mod colors;
mod commands;
mod display;
mod logging;

pub mod autosync;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod env;
pub mod error;
pub mod monitor;
pub mod net;
pub mod prefs;
pub mod queue;
pub mod status;
pub mod tenant;
pub mod transport;

#[cfg(test)]
mod test_helpers;

pub use cli::{Cli, Command, OutputFormat, Toggle};
pub use config::{find_data_dir, init_data_dir, Config};
pub use coordinator::{SyncConfig, SyncCoordinator};
pub use engine::Engine;
pub use error::{Error, Result};
pub use monitor::ConnectivityMonitor;
pub use queue::OfflineQueue;
pub use status::StatusFacade;
pub use transport::{RemoteStore, WsRemoteStore};

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(command: Command) -> Result<()> {
    match command {
        Command::Init { remote } => commands::init::run(remote),
        Command::Enqueue { category, payload } => commands::enqueue::run(category, &payload),
        Command::Pending { category, output } => commands::pending::run(category, output),
        Command::Login { token } => commands::session::login(&token),
        Command::Logout => commands::session::logout(),
        Command::AutoSync { value } => commands::auto_sync::run(value),
        Command::Sync { output } => block_on(commands::sync::run(output)),
        Command::Status { output } => block_on(commands::status::run(output)),
        Command::Watch => block_on(commands::watch::run()),
    }
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(future)
}
