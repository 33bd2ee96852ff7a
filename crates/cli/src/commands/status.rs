// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::cli::OutputFormat;
use crate::display::format_status;
use crate::error::Result;

pub async fn run(output: OutputFormat) -> Result<()> {
    let engine = super::open_engine()?;
    let status = engine.status.current_status().await;

    match output {
        OutputFormat::Text => println!("{}", format_status(&status)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
    }
    Ok(())
}
