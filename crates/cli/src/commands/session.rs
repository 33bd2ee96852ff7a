// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::Result;

pub fn login(token: &str) -> Result<()> {
    let prefs = super::open_prefs()?;
    prefs.set_session_token(Some(token.trim()))?;
    println!("Session token saved");
    Ok(())
}

pub fn logout() -> Result<()> {
    let prefs = super::open_prefs()?;
    prefs.set_session_token(None)?;
    println!("Session token cleared");
    Ok(())
}
