// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git + ledger pre-sync

use super::{SyncError, WorkspaceSync};
use crate::env::bd_program;
use crate::subprocess::{run_with_timeout, stderr_of, GIT_TIMEOUT, LEDGER_TIMEOUT};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// Fetch, rebase onto `origin/main`, then sync the ledger.
///
/// Every step is best-effort: a failed fetch still leaves a usable tree,
/// so failures are logged and the agent starts anyway.
#[derive(Clone, Default)]
pub struct GitWorkspaceSync;

impl GitWorkspaceSync {
    pub fn new() -> Self {
        Self
    }
}

async fn step(program: &str, args: &[&str], cwd: &Path, timeout: Duration) -> bool {
    let description = format!("{} {}", program, args.first().copied().unwrap_or_default());
    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(cwd);
    match run_with_timeout(cmd, timeout, &description).await {
        Ok(output) if output.status.success() => true,
        Ok(output) => {
            tracing::warn!(
                dir = %cwd.display(),
                stderr = %stderr_of(&output),
                "{} failed",
                description
            );
            false
        }
        Err(e) => {
            tracing::warn!(dir = %cwd.display(), error = %e, "pre-sync step failed");
            false
        }
    }
}

#[async_trait]
impl WorkspaceSync for GitWorkspaceSync {
    async fn sync(&self, work_dir: &Path) -> Result<(), SyncError> {
        if !work_dir.is_dir() {
            return Err(SyncError::MissingWorkDir(work_dir.display().to_string()));
        }

        let fetched = step("git", &["fetch", "origin"], work_dir, GIT_TIMEOUT).await;
        let rebased = step(
            "git",
            &["pull", "--rebase", "origin", "main"],
            work_dir,
            GIT_TIMEOUT,
        )
        .await;
        let ledger = step(&bd_program(), &["sync"], work_dir, LEDGER_TIMEOUT).await;

        tracing::info!(
            dir = %work_dir.display(),
            fetched,
            rebased,
            ledger,
            "pre-sync complete"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
