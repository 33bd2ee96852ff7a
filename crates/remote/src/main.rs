// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fieldsync-remote: WebSocket record store for fieldsync clients.
//!
//! Resolves session tokens to organizations and upserts records into
//! per-organization collections backed by SQLite.

mod server;
#[cfg(test)]
mod server_tests;
mod state;
mod store;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// fieldsync-remote: record store for offline field capture
#[derive(Parser, Debug)]
#[command(name = "fieldsync-remote")]
#[command(about = "WebSocket record store for fieldsync clients")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:7891")]
    bind: SocketAddr,

    /// Directory for the record database
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// Register a session token for an organization (TOKEN=ORG, repeatable)
    #[arg(long = "session", value_name = "TOKEN=ORG", value_parser = parse_session)]
    sessions: Vec<(String, String)>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_session(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((token, org)) if !token.is_empty() && !org.is_empty() => {
            Ok((token.to_string(), org.to_string()))
        }
        _ => Err(format!("expected TOKEN=ORG, got '{}'", s)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting fieldsync-remote server");
    info!("  Bind address: {}", args.bind);
    info!("  Data directory: {}", args.data.display());

    let state = state::ServerState::new(&args.data)?;
    for (token, org) in &args.sessions {
        state.add_session(token, org).await?;
        info!("  Session registered for organization {}", org);
    }

    server::run(args.bind, state).await?;

    Ok(())
}
