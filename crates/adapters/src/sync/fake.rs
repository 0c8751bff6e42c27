// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake workspace sync for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SyncError, WorkspaceSync};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Default)]
struct FakeSyncState {
    synced: Vec<PathBuf>,
    fail: bool,
}

/// Records synced directories without touching them
#[derive(Clone, Default)]
pub struct FakeWorkspaceSync {
    inner: Arc<Mutex<FakeSyncState>>,
}

impl FakeWorkspaceSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn synced(&self) -> Vec<PathBuf> {
        self.inner.lock().synced.clone()
    }

    pub fn set_fail(&self, fail: bool) {
        self.inner.lock().fail = fail;
    }
}

#[async_trait]
impl WorkspaceSync for FakeWorkspaceSync {
    async fn sync(&self, work_dir: &Path) -> Result<(), SyncError> {
        let mut inner = self.inner.lock();
        inner.synced.push(work_dir.to_path_buf());
        if inner.fail {
            return Err(SyncError::Failed("sync refused".to_string()));
        }
        Ok(())
    }
}
