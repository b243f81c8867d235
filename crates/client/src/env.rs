// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.

use std::path::PathBuf;

/// Environment variable names.
pub mod vars {
    /// Path of the config file, overriding the default location.
    pub const OFFSYNC_CONFIG: &str = "OFFSYNC_CONFIG";
}

/// Returns the value of `OFFSYNC_CONFIG` if set and non-empty.
pub fn config_path() -> Option<PathBuf> {
    std::env::var_os(vars::OFFSYNC_CONFIG)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
