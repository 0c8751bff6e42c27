// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controlling a running supervisor through its pid file.
//!
//! The file lock is what keeps a second supervisor out; these helpers only
//! serve status tooling and are allowed to be racy.

use std::path::Path;
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{info, warn};

use super::LifecycleError;
use crate::config::Config;

/// How often `stop` re-checks the process during the grace period
const STOP_POLL: Duration = Duration::from_millis(100);

/// Read the pid file. Missing or garbled files yield `None`.
pub fn read_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|pid| *pid > 0 && i32::try_from(*pid).is_ok())
}

/// Whether a process with this pid exists (signal 0).
pub fn process_alive(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false,
        // Exists but belongs to someone else
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Pid of the running supervisor, if any.
///
/// A pid file naming a dead process is stale and gets removed.
pub fn is_running(config: &Config) -> Option<u32> {
    let pid = read_pid(&config.pid_path)?;
    if process_alive(pid) {
        return Some(pid);
    }
    if let Err(e) = std::fs::remove_file(&config.pid_path) {
        warn!(error = %e, "failed to remove stale pid file");
    }
    None
}

fn send(pid: u32, signal: Signal) -> Result<(), LifecycleError> {
    let raw = i32::try_from(pid).map_err(|_| LifecycleError::Signal(pid, Errno::EINVAL))?;
    kill(Pid::from_raw(raw), signal).map_err(|e| LifecycleError::Signal(pid, e))
}

/// Stop the running supervisor: SIGTERM, then SIGKILL once `grace` has
/// passed. Returns `false` when nothing was running.
pub async fn stop(config: &Config, grace: Duration) -> Result<bool, LifecycleError> {
    let Some(pid) = is_running(config) else {
        return Ok(false);
    };

    send(pid, Signal::SIGTERM)?;
    info!(pid, "sent SIGTERM");

    let deadline = tokio::time::Instant::now() + grace;
    while tokio::time::Instant::now() < deadline {
        if !process_alive(pid) {
            break;
        }
        tokio::time::sleep(STOP_POLL).await;
    }

    if process_alive(pid) {
        warn!(pid, "still running after grace period, sending SIGKILL");
        // Exiting between the check and the signal is fine
        let _ = send(pid, Signal::SIGKILL);
    }

    if config.pid_path.exists() {
        let _ = std::fs::remove_file(&config.pid_path);
    }
    Ok(true)
}

/// Ask the running supervisor to drain lifecycle requests now (SIGUSR1).
pub fn poke(config: &Config) -> Result<bool, LifecycleError> {
    let Some(pid) = is_running(config) else {
        return Ok(false);
    };
    send(pid, Signal::SIGUSR1)?;
    Ok(true)
}
