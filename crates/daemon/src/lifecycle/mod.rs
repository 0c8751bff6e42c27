// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor lifecycle management: single-instance startup, the persisted
//! state record, and shutdown.

pub mod control;

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: supervisor already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Invalid state record {0}: {1}")]
    State(String, serde_json::Error),

    #[error("Failed to signal process {0}: {1}")]
    Signal(u32, nix::errno::Errno),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persisted supervisor state (`state.json`).
///
/// Informational only: nothing about agent liveness is kept here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonState {
    pub running: bool,
    pub pid: u32,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_heartbeat: Option<DateTime<Utc>>,
    #[serde(default)]
    pub heartbeat_count: u64,
}

impl DaemonState {
    /// Load the state record. A missing file is `None`.
    pub fn load(path: &Path) -> Result<Option<Self>, LifecycleError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| LifecycleError::State(path.display().to_string(), e))
    }

    /// Write atomically: readers see the old record or the new one, never
    /// a torn write.
    pub fn save(&self, path: &Path) -> Result<(), LifecycleError> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| LifecycleError::State(path.display().to_string(), e))?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// A running supervisor process: holds the lock for as long as it lives.
pub struct Daemon {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub state: DaemonState,
}

impl Daemon {
    /// Record a completed heartbeat. Failing to persist it is only a warning.
    pub fn record_heartbeat(&mut self, at: DateTime<Utc>) {
        self.state.last_heartbeat = Some(at);
        self.state.heartbeat_count += 1;
        if let Err(e) = self.state.save(&self.config.state_path) {
            warn!(error = %e, "failed to save state");
        }
        info!(count = self.state.heartbeat_count, "heartbeat complete");
    }

    /// Shutdown gracefully.
    ///
    /// Agent sessions are left running; the next supervisor rediscovers
    /// them from tmux.
    pub fn shutdown(mut self) -> Result<(), LifecycleError> {
        info!("Shutting down supervisor...");

        // 1. Flush final state
        self.state.running = false;
        if let Err(e) = self.state.save(&self.config.state_path) {
            warn!(error = %e, "failed to save final state");
        }

        // 2. Remove PID file
        if self.config.pid_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.pid_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // 3. Lock is released when self.lock_file is dropped
        info!("Supervisor shutdown complete");
        Ok(())
    }
}

/// Start the supervisor: take the lock, then write the pid and state.
pub fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    match startup_inner(config) {
        Ok(daemon) => Ok(daemon),
        Err(e) => {
            // Don't clean up if we failed to acquire the lock: those
            // files belong to the already-running supervisor.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

fn startup_inner(config: &Config) -> Result<Daemon, LifecycleError> {
    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents races
    // Open without truncating so nothing of the running supervisor's is
    // touched before we hold the lock.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // 3. Write PID file now that we hold the lock
    let pid = std::process::id();
    let mut pid_file = File::create(&config.pid_path)?;
    writeln!(pid_file, "{}", pid)?;

    // 4. Fresh state record; counters restart with the process
    let state = DaemonState {
        running: true,
        pid,
        started_at: Some(Utc::now()),
        last_heartbeat: None,
        heartbeat_count: 0,
    };
    state.save(&config.state_path)?;

    info!(pid, state_dir = %config.state_dir.display(), "lock acquired");
    Ok(Daemon {
        config: config.clone(),
        lock_file,
        state,
    })
}

/// Remove files written by a failed startup
fn cleanup_on_failure(config: &Config) {
    if config.pid_path.exists() {
        let _ = std::fs::remove_file(&config.pid_path);
    }
}

#[cfg(test)]
#[path = "../lifecycle_tests/mod.rs"]
mod tests;
