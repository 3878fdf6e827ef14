// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration management.
//!
//! Configuration is read from `config.toml` in the platform config directory
//! (`~/.config/chatsync/config.toml` on Linux) or from `--config <PATH>`.
//! Every section and key is optional; a missing default file means defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::network::ProbeConfig;
use crate::presence::Backoff;

const APP_DIR_NAME: &str = "chatsync";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "chat.db";
const LOCK_FILE_SUFFIX: &str = "lock";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub network: NetworkConfig,
    pub log: LogConfig,
}

/// Remote service connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    /// WebSocket URL (`ws://...` or `wss://...`).
    pub url: String,
    /// Max time to wait for each sync response in milliseconds (default: 10000).
    pub request_timeout_ms: u64,
    /// Maximum consecutive presence reconnection attempts (default: 0 = unlimited).
    pub reconnect_max_retries: u32,
    /// Maximum delay between reconnection attempts in seconds (default: 30).
    pub reconnect_max_delay_secs: u64,
    /// Initial reconnection delay in milliseconds (default: 100).
    pub initial_delay_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            url: "ws://localhost:7890".to_string(),
            request_timeout_ms: 10_000,
            reconnect_max_retries: 0,
            reconnect_max_delay_secs: 30,
            initial_delay_ms: 100,
        }
    }
}

/// Sync scheduling and storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Period of the background pending-changes check in milliseconds (default: 300000).
    pub interval_ms: u64,
    /// Local database path (default: platform data dir).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            interval_ms: 300_000,
            database: None,
        }
    }
}

/// Connectivity probe settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// `host:port` (IP literal) that must accept a TCP connection to count as connected.
    pub probe_addr: String,
    /// `host:port` whose DNS resolution decides internet reachability.
    pub reachability_host: String,
    pub poll_interval_ms: u64,
    pub probe_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let probe = ProbeConfig::default();
        NetworkConfig {
            probe_addr: probe.probe_addr,
            reachability_host: probe.reachability_host,
            poll_interval_ms: duration_ms(probe.poll_interval),
            probe_timeout_ms: duration_ms(probe.probe_timeout),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Append logs here instead of stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Platform config file location, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Platform database location, falling back to the current directory.
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(DB_FILE_NAME)
}

impl Config {
    /// Loads configuration from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        Self::parse(&content)
    }

    /// Parses and validates configuration TOML.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the explicit path if given, otherwise the default location.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::ConfigNotFound(path.display().to_string()));
            }
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Checks values serde cannot.
    pub fn validate(&self) -> Result<()> {
        let url = &self.remote.url;
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(Error::InvalidRemoteUrl(url.clone()));
        }
        let durations = [
            ("remote.request_timeout_ms", self.remote.request_timeout_ms),
            ("remote.initial_delay_ms", self.remote.initial_delay_ms),
            (
                "remote.reconnect_max_delay_secs",
                self.remote.reconnect_max_delay_secs,
            ),
            ("sync.interval_ms", self.sync.interval_ms),
            ("network.poll_interval_ms", self.network.poll_interval_ms),
            ("network.probe_timeout_ms", self.network.probe_timeout_ms),
        ];
        for (field, value) in durations {
            if value == 0 {
                return Err(Error::ZeroDuration { field });
            }
        }
        Ok(())
    }

    /// Effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))
    }

    pub fn database_path(&self) -> PathBuf {
        self.sync.database.clone().unwrap_or_else(default_db_path)
    }

    /// Lock file guarding the database against concurrent sessions.
    pub fn lock_path(&self) -> PathBuf {
        let db = self.database_path();
        let mut name = db.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".");
        name.push(LOCK_FILE_SUFFIX);
        db.with_file_name(name)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync.interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.remote.request_timeout_ms)
    }

    pub fn probe(&self) -> ProbeConfig {
        ProbeConfig {
            probe_addr: self.network.probe_addr.clone(),
            reachability_host: self.network.reachability_host.clone(),
            poll_interval: Duration::from_millis(self.network.poll_interval_ms),
            probe_timeout: Duration::from_millis(self.network.probe_timeout_ms),
        }
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            max_retries: self.remote.reconnect_max_retries,
            initial_delay_ms: self.remote.initial_delay_ms,
            max_delay_secs: self.remote.reconnect_max_delay_secs,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
