// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::cli::Toggle;
use crate::error::Result;

pub fn run(value: Toggle) -> Result<()> {
    let prefs = super::open_prefs()?;
    prefs.set_auto_sync(value.enabled())?;
    println!(
        "Auto-sync {}",
        if value.enabled() { "enabled" } else { "disabled" }
    );
    Ok(())
}
