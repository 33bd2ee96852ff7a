// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::cli::OutputFormat;
use crate::display::format_sync_result;
use crate::error::{Error, Result};

/// Drain the queue once and report the outcome.
///
/// Exits non-zero when the attempt did not succeed; the queue is left for
/// the next attempt either way.
pub async fn run(output: OutputFormat) -> Result<()> {
    let engine = super::open_engine()?;
    let result = engine.status.trigger_manual_sync().await;

    match output {
        OutputFormat::Text => println!("{}", format_sync_result(&result)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    if !result.success {
        return Err(Error::SyncFailed(result.message));
    }
    Ok(())
}
