// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor paths and role configuration loading.

use std::path::{Path, PathBuf};

use thiserror::Error;
use warden_core::{RoleError, RoleResolver, RolesFile};

use crate::env;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine deployment root (set WARDEN_ROOT or HOME)")]
    NoRoot,

    #[error("role configuration: {0}")]
    Roles(#[from] RoleError),
}

/// Supervisor configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment root (e.g. ~/warden)
    pub root: PathBuf,
    /// Process-local state directory (e.g. ~/warden/daemon)
    pub state_dir: PathBuf,
    /// Exclusive lock held for the supervisor's lifetime
    pub lock_path: PathBuf,
    /// PID file, written only once the lock is held
    pub pid_path: PathBuf,
    /// Persisted state record
    pub state_path: PathBuf,
    /// Outcome of the last mechanical triage
    pub triage_path: PathBuf,
    /// Supervisor log file
    pub log_path: PathBuf,
    /// Role records
    pub roles_path: PathBuf,
    /// Heartbeat file the relay writes on each patrol cycle
    pub heartbeat_path: PathBuf,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// One supervisor serves every project under the deployment root.
    pub fn load() -> Result<Self, ConfigError> {
        let root = env::root_dir()?;
        let state_dir = env::state_dir().unwrap_or_else(|| root.join("daemon"));
        Ok(Self::for_dirs(root, state_dir))
    }

    /// Configuration with every path derived from `root` and `state_dir`.
    pub fn for_dirs(root: impl Into<PathBuf>, state_dir: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let state_dir = state_dir.into();
        Self {
            lock_path: state_dir.join("daemon.lock"),
            pid_path: state_dir.join("daemon.pid"),
            state_path: state_dir.join("state.json"),
            triage_path: state_dir.join("triage.json"),
            log_path: state_dir.join("daemon.log"),
            roles_path: root.join("settings").join("roles.toml"),
            heartbeat_path: root.join("relay").join("heartbeat.json"),
            state_dir,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read `roles.toml` (a missing file means built-in defaults only).
    pub fn load_roles(&self) -> Result<RoleResolver, ConfigError> {
        let file = RolesFile::load(&self.roles_path)?;
        Ok(RoleResolver::new(&self.root, file))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
