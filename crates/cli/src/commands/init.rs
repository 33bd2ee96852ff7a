// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::config::init_data_dir;
use crate::error::Result;

pub fn run(remote: Option<String>) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let data_dir = init_data_dir(&cwd, remote.as_deref())?;
    println!("Initialized fieldsync at {}", data_dir.display());
    Ok(())
}
