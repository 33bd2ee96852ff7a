// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration management.
//!
//! Configuration is stored in `.fieldsync/config.toml`, next to the queue,
//! the preferences file and the log. Every field has a default so a partial
//! file (or an empty one) loads.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fieldsync_core::TransportType;

use crate::coordinator::SyncConfig;
use crate::error::{Error, Result};
use crate::transport::RetryPolicy;

pub const DATA_DIR_NAME: &str = ".fieldsync";
const CONFIG_FILE_NAME: &str = "config.toml";
pub const LOG_FILE_NAME: &str = "fieldsync.log";

/// Client configuration stored in `.fieldsync/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub sync: SyncSettings,
}

/// Where records are pushed and how long to wait for the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// WebSocket URL of the remote store (`ws://` or `wss://`).
    #[serde(default = "default_remote_url")]
    pub url: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Bound on the reachability probe run before each drain.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Bound on resolving the session to an organization.
    #[serde(default = "default_tenant_timeout_ms")]
    pub tenant_timeout_ms: u64,
    /// Bound on each record upsert, retries included.
    #[serde(default = "default_upsert_timeout_ms")]
    pub upsert_timeout_ms: u64,
    /// Attempts per request when the connection fails, including the first.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Wait before the first retry; doubles after each failed attempt.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
}

/// How the device decides it is online.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Host dialled to decide whether the internet is reachable.
    #[serde(default = "default_probe_host")]
    pub probe_host: String,
    #[serde(default = "default_network_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Link type reported alongside the reading.
    #[serde(default)]
    pub transport: TransportType,
}

/// Background sync behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Auto-sync preference used until the user sets one.
    #[serde(default = "default_auto_sync")]
    pub auto_sync_default: bool,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub refresh_jitter_ms: u64,
    #[serde(default = "default_monitor_tick_ms")]
    pub monitor_tick_ms: u64,
}

fn default_remote_url() -> String {
    "ws://localhost:7891".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_probe_timeout_ms() -> u64 {
    3_000
}

fn default_tenant_timeout_ms() -> u64 {
    5_000
}

fn default_upsert_timeout_ms() -> u64 {
    10_000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_base_ms() -> u64 {
    1_000
}

fn default_probe_host() -> String {
    "1.1.1.1:443".to_string()
}

fn default_network_probe_timeout_ms() -> u64 {
    2_000
}

fn default_auto_sync() -> bool {
    true
}

fn default_refresh_interval_secs() -> u64 {
    30
}

fn default_monitor_tick_ms() -> u64 {
    2_000
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            url: default_remote_url(),
            connect_timeout_ms: default_connect_timeout_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            tenant_timeout_ms: default_tenant_timeout_ms(),
            upsert_timeout_ms: default_upsert_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            retry_base_ms: default_retry_base_ms(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            probe_host: default_probe_host(),
            probe_timeout_ms: default_network_probe_timeout_ms(),
            transport: TransportType::default(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            auto_sync_default: default_auto_sync(),
            refresh_interval_secs: default_refresh_interval_secs(),
            refresh_jitter_ms: 0,
            monitor_tick_ms: default_monitor_tick_ms(),
        }
    }
}

impl RemoteConfig {
    /// Validates that the URL is a WebSocket URL.
    ///
    /// Returns an error message if the URL is invalid.
    pub fn validate_url(&self) -> Option<String> {
        if self.url.starts_with("ws://") || self.url.starts_with("wss://") {
            return None;
        }
        Some(format!(
            "invalid remote URL '{}': must be ws:// or wss://",
            self.url
        ))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts,
            base_delay: Duration::from_millis(self.retry_base_ms),
        }
    }
}

impl NetworkConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl SyncSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn refresh_jitter(&self) -> Duration {
        Duration::from_millis(self.refresh_jitter_ms)
    }

    pub fn monitor_tick(&self) -> Duration {
        Duration::from_millis(self.monitor_tick_ms)
    }
}

impl Config {
    /// Creates a default config pointing at the given remote.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL is not a WebSocket URL.
    pub fn new(remote_url: Option<&str>) -> Result<Self> {
        let mut config = Config::default();
        if let Some(url) = remote_url {
            config.remote.url = url.to_string();
        }
        if let Some(msg) = config.remote.validate_url() {
            return Err(Error::Config(msg));
        }
        Ok(config)
    }

    /// Loads configuration from the given `.fieldsync/` directory.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        if let Some(msg) = config.remote.validate_url() {
            return Err(Error::Config(msg));
        }
        Ok(config)
    }

    /// Saves configuration to the given `.fieldsync/` directory.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let config_path = data_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Drain timeouts derived from the remote section.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            probe_timeout: Duration::from_millis(self.remote.probe_timeout_ms),
            tenant_timeout: Duration::from_millis(self.remote.tenant_timeout_ms),
            upsert_timeout: Duration::from_millis(self.remote.upsert_timeout_ms),
        }
    }
}

/// Find the data directory.
///
/// `FIELDSYNC_DIR` wins when set; otherwise walks up from the current
/// directory looking for `.fieldsync/`.
pub fn find_data_dir() -> Result<PathBuf> {
    if let Some(dir) = crate::env::data_dir() {
        if dir.join(CONFIG_FILE_NAME).is_file() {
            return Ok(dir);
        }
        return Err(Error::NotInitialized);
    }
    find_data_dir_from(&std::env::current_dir()?)
}

/// Walk up from `start` looking for `.fieldsync/`.
pub fn find_data_dir_from(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let data_dir = current.join(DATA_DIR_NAME);
        if data_dir.is_dir() {
            return Ok(data_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

/// Initialize a new data directory.
///
/// With `FIELDSYNC_DIR` set that directory is used as-is; otherwise
/// `.fieldsync/` is created under `path`.
pub fn init_data_dir(path: &Path, remote_url: Option<&str>) -> Result<PathBuf> {
    let data_dir = crate::env::data_dir().unwrap_or_else(|| path.join(DATA_DIR_NAME));
    init_data_dir_at(&data_dir, remote_url)?;
    Ok(data_dir)
}

/// Initialize `data_dir` itself as a data directory.
pub fn init_data_dir_at(data_dir: &Path, remote_url: Option<&str>) -> Result<()> {
    if data_dir.join(CONFIG_FILE_NAME).exists() {
        return Err(Error::AlreadyInitialized(data_dir.display().to_string()));
    }

    let config = Config::new(remote_url)?;
    fs::create_dir_all(data_dir)?;
    config.save(data_dir)?;
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
