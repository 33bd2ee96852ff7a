// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal color utilities for command output.
//!
//! Respects environment variables:
//! - `NO_COLOR=1`: Disables colors
//! - `COLOR=1`: Forces colors even without TTY

use std::io::IsTerminal;

/// ANSI 256-color codes.
pub mod codes {
    /// Labels: pastel cyan/steel blue
    pub const HEADER: u8 = 74;
    /// Healthy state: soft green
    pub const GOOD: u8 = 114;
    /// Degraded state: soft orange
    pub const WARN: u8 = 179;
    /// Secondary detail: medium grey
    pub const CONTEXT: u8 = 245;
}

/// Check if colors should be enabled based on TTY and environment variables.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

fn paint(code: u8, text: &str) -> String {
    if !should_colorize() {
        return text.to_string();
    }
    format!("\x1b[38;5;{code}m{text}\x1b[0m")
}

pub fn header(text: &str) -> String {
    paint(codes::HEADER, text)
}

pub fn context(text: &str) -> String {
    paint(codes::CONTEXT, text)
}

/// Green when `good`, orange otherwise.
pub fn state(good: bool, text: &str) -> String {
    paint(if good { codes::GOOD } else { codes::WARN }, text)
}

#[cfg(test)]
#[path = "colors_tests.rs"]
mod tests;
