// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use fieldsync_core::Category;

use crate::cli::OutputFormat;
use crate::display::{format_entry, PendingJson};
use crate::error::Result;

pub fn run(category: Option<Category>, output: OutputFormat) -> Result<()> {
    let queue = super::open_queue()?;
    let entries = queue.list_pending(category)?;

    match output {
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No pending records");
            }
            for entry in &entries {
                println!("{}", format_entry(entry));
            }
        }
        OutputFormat::Json => {
            let json: Vec<PendingJson> = entries.iter().map(PendingJson::from).collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}
