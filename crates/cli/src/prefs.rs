// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted user preferences.
//!
//! A small JSON key-value file (`prefs.json`) in the data directory holding
//! the auto-sync toggle, the last successful sync time and the session token.
//! Values are re-read on every access so that a `fieldsync login` in one
//! process is seen by a running `fieldsync watch`. Writes replace the file
//! atomically under an advisory lock on a sidecar file, so concurrent
//! read-modify-write cycles from several processes never lose an update.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use fieldsync_core::LastSync;

pub const AUTO_SYNC_KEY: &str = "auto_sync";
pub const LAST_SYNC_KEY: &str = "last_sync_time";
pub const SESSION_TOKEN_KEY: &str = "session_token";

/// Error type for preference storage.
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid preferences file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("preferences lock failed: {0}")]
    Lock(std::io::Error),
}

pub type PrefsResult<T> = Result<T, PrefsError>;

/// Snapshot of every preference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefsSnapshot {
    pub auto_sync: bool,
    pub last_sync_time: LastSync,
    pub session_token: Option<String>,
}

/// Preferences backed by a JSON file.
pub struct Prefs {
    path: PathBuf,
    auto_sync_default: bool,
    write_lock: Mutex<()>,
}

impl Prefs {
    pub const FILE_NAME: &'static str = "prefs.json";

    /// `auto_sync_default` applies while the user has never set the toggle.
    pub fn new(path: &Path, auto_sync_default: bool) -> Self {
        Prefs {
            path: path.to_path_buf(),
            auto_sync_default,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn auto_sync(&self) -> bool {
        self.read_map()
            .get(AUTO_SYNC_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(self.auto_sync_default)
    }

    pub fn set_auto_sync(&self, enabled: bool) -> PrefsResult<()> {
        self.update(|map| {
            map.insert(AUTO_SYNC_KEY.to_string(), Value::Bool(enabled));
        })
    }

    /// Last successful sync; unreadable values count as never.
    pub fn last_sync(&self) -> LastSync {
        self.read_map()
            .get(LAST_SYNC_KEY)
            .and_then(Value::as_str)
            .map(LastSync::parse_lenient)
            .unwrap_or_default()
    }

    pub fn set_last_sync(&self, last: LastSync) -> PrefsResult<()> {
        self.update(|map| {
            map.insert(LAST_SYNC_KEY.to_string(), Value::String(last.to_string()));
        })
    }

    pub fn session_token(&self) -> Option<String> {
        self.read_map()
            .get(SESSION_TOKEN_KEY)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    /// Store or clear the session token.
    pub fn set_session_token(&self, token: Option<&str>) -> PrefsResult<()> {
        self.update(|map| match token {
            Some(token) => {
                map.insert(
                    SESSION_TOKEN_KEY.to_string(),
                    Value::String(token.to_string()),
                );
            }
            None => {
                map.remove(SESSION_TOKEN_KEY);
            }
        })
    }

    pub fn snapshot(&self) -> PrefsSnapshot {
        PrefsSnapshot {
            auto_sync: self.auto_sync(),
            last_sync_time: self.last_sync(),
            session_token: self.session_token(),
        }
    }

    fn read_map(&self) -> Map<String, Value> {
        match self.load() {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable preferences");
                Map::new()
            }
        }
    }

    fn load(&self) -> PrefsResult<Map<String, Value>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn update(&self, change: impl FnOnce(&mut Map<String, Value>)) -> PrefsResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let _lock = self.lock_exclusive()?;

        // A corrupt file is replaced rather than blocking every write
        let mut map = self.read_map();
        change(&mut map);

        let json = serde_json::to_string_pretty(&map)?;
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Sidecar lock shared by every process writing these preferences.
    fn lock_exclusive(&self) -> PrefsResult<File> {
        let mut lock_name = self.path.as_os_str().to_owned();
        lock_name.push(".lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(PathBuf::from(lock_name))
            .map_err(PrefsError::Lock)?;
        file.lock_exclusive().map_err(PrefsError::Lock)?;
        Ok(file)
    }
}

#[cfg(test)]
#[path = "prefs_tests.rs"]
mod tests;
