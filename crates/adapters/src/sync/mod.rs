// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Working tree synchronisation before an agent starts

mod git;

pub use git::GitWorkspaceSync;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeWorkspaceSync;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("working directory does not exist: {0}")]
    MissingWorkDir(String),
    #[error("sync failed: {0}")]
    Failed(String),
}

/// Bring a working tree up to date with its upstream
#[async_trait]
pub trait WorkspaceSync: Clone + Send + Sync + 'static {
    async fn sync(&self, work_dir: &Path) -> Result<(), SyncError>;
}
