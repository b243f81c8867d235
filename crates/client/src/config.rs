// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is read from a TOML file, located in order of precedence:
//! - the `--config` flag
//! - the `OFFSYNC_CONFIG` environment variable
//! - `<config dir>/offsync/config.toml`
//!
//! A missing file at the default locations yields the built-in defaults.
//! Every key is optional.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};
use crate::sync::{SyncConfig, TransportConfig};

const APP_DIR_NAME: &str = "offsync";
const CONFIG_FILE_NAME: &str = "config.toml";
const QUEUE_FILE_NAME: &str = "queue.jsonl";

/// Client configuration stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Location of the JSONL queue file.
    #[serde(default = "default_queue_path")]
    pub queue_path: PathBuf,
    /// Seconds between periodic drains (default: 30).
    #[serde(default = "default_drain_interval_secs")]
    pub drain_interval_secs: u64,
    /// Failed drain attempts tolerated before a mutation is dropped (default: 5).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Remote document store connection.
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Remote store connection settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteConfig {
    /// WebSocket URL of the remote store (default: `ws://localhost:7890`).
    #[serde(default = "default_url")]
    pub url: String,
    /// Max time for connecting and for each request in milliseconds (default: 10000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Maximum reconnection attempts before giving up (default: 10).
    #[serde(default = "default_reconnect_max_retries")]
    pub max_retries: u32,
    /// Initial reconnection backoff in milliseconds (default: 100).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Maximum delay between reconnection attempts in seconds (default: 30).
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

fn default_queue_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(QUEUE_FILE_NAME)
}

fn default_drain_interval_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    5
}

fn default_url() -> String {
    "ws://localhost:7890".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_reconnect_max_retries() -> u32 {
    10
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_max_delay_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Config {
            queue_path: default_queue_path(),
            drain_interval_secs: default_drain_interval_secs(),
            max_retries: default_max_retries(),
            remote: RemoteConfig::default(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            url: default_url(),
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_reconnect_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

/// Default config file location, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

impl Config {
    /// Loads and validates configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed, or if
    /// a value is out of range.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolves the config file and loads it.
    ///
    /// An explicit path must exist. The environment and default locations
    /// fall back to [`Config::default`] when no file is present.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match env::config_path().or_else(default_config_path) {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Config::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.drain_interval_secs == 0 {
            return Err(Error::Config("drain_interval_secs must be positive".into()));
        }
        if self.remote.request_timeout_ms == 0 {
            return Err(Error::Config(
                "remote.request_timeout_ms must be positive".into(),
            ));
        }
        if !(self.remote.url.starts_with("ws://") || self.remote.url.starts_with("wss://")) {
            return Err(Error::Config(format!(
                "invalid remote URL '{}': must be ws:// or wss://",
                self.remote.url
            )));
        }
        Ok(())
    }

    /// Settings for the sync queue manager.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            drain_interval: Duration::from_secs(self.drain_interval_secs),
            max_retries: self.max_retries,
        }
    }

    /// Settings for the WebSocket executor.
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            url: self.remote.url.clone(),
            request_timeout: Duration::from_millis(self.remote.request_timeout_ms),
            max_retries: self.remote.max_retries,
            initial_delay_ms: self.remote.initial_delay_ms,
            max_delay_secs: self.remote.max_delay_secs,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
