// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project registry and per-project operational settings.
//!
//! `projects.json` at the deployment root lists the known projects.
//! `<root>/<project>/project.toml` may park or dock a project, or turn off
//! automatic restarts for it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from reading project files
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid project settings {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid project registry {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Operational status of a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    /// Temporarily out of service
    Parked,
    /// Retired until explicitly undocked
    Docked,
}

/// Contents of `project.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(default)]
    pub status: ProjectStatus,
    /// Unset means enabled
    #[serde(default)]
    pub auto_restart: Option<bool>,
}

impl ProjectSettings {
    pub fn path(root: &Path, project: &str) -> PathBuf {
        root.join(project).join("project.toml")
    }

    /// Load a project's settings. A missing file means an active project.
    pub fn load(root: &Path, project: &str) -> Result<Self, ProjectError> {
        let path = Self::path(root, project);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ProjectError::Io { path, source }),
        };
        toml::from_str(&content).map_err(|source| ProjectError::Toml { path, source })
    }

    /// Why agents in this project must not be auto-started, if they must not.
    pub fn blocked_reason(&self) -> Option<&'static str> {
        match (self.status, self.auto_restart) {
            (ProjectStatus::Parked, _) => Some("project is parked"),
            (ProjectStatus::Docked, _) => Some("project is docked"),
            (ProjectStatus::Active, Some(false)) => Some("auto_restart is disabled"),
            (ProjectStatus::Active, _) => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    projects: BTreeMap<String, serde_json::Value>,
}

/// Known projects, in name order.
pub fn load_registry(root: &Path) -> Result<Vec<String>, ProjectError> {
    let path = root.join("projects.json");
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(ProjectError::Io { path, source }),
    };
    let file: RegistryFile =
        serde_json::from_str(&content).map_err(|source| ProjectError::Json { path, source })?;
    Ok(file.projects.into_keys().collect())
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
