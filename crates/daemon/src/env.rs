// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConfigError;

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.trim().is_empty())
}

/// Resolve the deployment root: WARDEN_ROOT > ~/warden
pub fn root_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = non_empty("WARDEN_ROOT") {
        return Ok(PathBuf::from(dir));
    }
    let home = non_empty("HOME").ok_or(ConfigError::NoRoot)?;
    Ok(PathBuf::from(home).join("warden"))
}

/// State directory override (default is `<root>/daemon`)
pub fn state_dir() -> Option<PathBuf> {
    non_empty("WARDEN_STATE_DIR").map(PathBuf::from)
}

/// Heartbeat interval override in seconds
pub fn heartbeat_secs() -> Option<Duration> {
    non_empty("WARDEN_HEARTBEAT_SECS")
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Force mechanical triage even when tmux is reachable
pub fn degraded() -> bool {
    std::env::var("WARDEN_DEGRADED").is_ok_and(|v| v == "true")
}
