// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand, ValueEnum};

use fieldsync_core::Category;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Value of the auto-sync preference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        self == Toggle::On
    }
}

#[derive(Parser)]
#[command(name = "fieldsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first capture and sync of field records")]
#[command(
    long_about = "Offline-first capture and sync of field records.\n\n\
    Records are queued durably on this device and pushed to the remote store \
    when a connection is available, manually or automatically on reconnect."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the data directory and config
    Init {
        /// Remote store URL (ws:// or wss://)
        #[arg(long)]
        remote: Option<String>,
    },

    /// Queue a record for the remote store
    #[command(after_help = "\
Examples:
  fieldsync enqueue scan '{\"barcode\":\"TEST123\",\"mode\":\"SHIP\",\"order_number\":\"ORD-1\"}'
  fieldsync enqueue customer '{\"customer_id\":\"C-1\",\"name\":\"Acme\"}'")]
    Enqueue {
        /// Record category: customer, asset, rental, scan, fill
        category: Category,
        /// Record fields as a JSON object
        #[arg(value_parser = non_empty_string)]
        payload: String,
    },

    /// List queued records
    Pending {
        /// Only show this category
        #[arg(long, short)]
        category: Option<Category>,
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Push queued records to the remote store now
    Sync {
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Show connectivity, queue size and last sync time
    Status {
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Store the session token used to resolve the organization
    Login {
        #[arg(value_parser = non_empty_string)]
        token: String,
    },

    /// Forget the stored session token
    Logout,

    /// Turn syncing on reconnect on or off
    AutoSync {
        #[arg(value_enum)]
        value: Toggle,
    },

    /// Monitor connectivity and sync on reconnect until interrupted
    Watch,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
