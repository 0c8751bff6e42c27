// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux session adapter

use super::{SessionAdapter, SessionError, SessionStyle};
use crate::env::tmux_timeout;
use crate::subprocess::{run_with_timeout, stderr_of};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Tmux-based session adapter
#[derive(Clone, Default)]
pub struct TmuxAdapter;

impl TmuxAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionAdapter for TmuxAdapter {
    async fn is_available(&self) -> bool {
        let mut cmd = Command::new("tmux");
        cmd.arg("-V");
        matches!(
            run_with_timeout(cmd, tmux_timeout(), "tmux -V").await,
            Ok(output) if output.status.success()
        )
    }

    async fn has_session(&self, name: &str) -> Result<bool, SessionError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["has-session", "-t", &exact(name)]);
        let output = run_with_timeout(cmd, tmux_timeout(), "tmux has-session")
            .await
            .map_err(SessionError::CommandFailed)?;
        Ok(output.status.success())
    }

    async fn is_program_running(&self, name: &str, pattern: &str) -> Result<bool, SessionError> {
        let output = tmux_output(
            &["list-panes", "-t", &exact(name), "-F", "#{pane_pid}"],
            "tmux list-panes",
        )
        .await?;

        let pane_pid = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        if pane_pid.is_empty() {
            return Ok(false);
        }

        // The agent is either the pane process itself (exec) or a child of the shell.
        let (ps_output, pgrep_output) = tokio::try_join!(
            async {
                let mut cmd = Command::new("ps");
                cmd.args(["-p", &pane_pid, "-o", "command="]);
                run_with_timeout(cmd, tmux_timeout(), "ps pane check")
                    .await
                    .map_err(SessionError::CommandFailed)
            },
            async {
                let mut cmd = Command::new("pgrep");
                cmd.args(["-P", &pane_pid, "-f", pattern]);
                run_with_timeout(cmd, tmux_timeout(), "pgrep child check")
                    .await
                    .map_err(SessionError::CommandFailed)
            },
        )?;

        if ps_output.status.success() {
            let cmd_line = String::from_utf8_lossy(&ps_output.stdout);
            if cmd_line.contains(pattern) {
                return Ok(true);
            }
        }

        Ok(pgrep_output.status.success())
    }

    async fn create(&self, name: &str, cwd: &Path) -> Result<(), SessionError> {
        if !cwd.is_dir() {
            return Err(SessionError::MissingWorkDir(cwd.display().to_string()));
        }

        let mut cmd = Command::new("tmux");
        cmd.args(["new-session", "-d", "-s", name, "-c"]).arg(cwd);
        let output = run_with_timeout(cmd, tmux_timeout(), "tmux new-session")
            .await
            .map_err(SessionError::CreateFailed)?;

        if !output.status.success() {
            let stderr = stderr_of(&output);
            if stderr.contains("duplicate session") {
                return Err(SessionError::AlreadyExists(name.to_string()));
            }
            tracing::error!(session = name, stderr = %stderr, "tmux new-session failed");
            return Err(SessionError::CreateFailed(stderr));
        }

        Ok(())
    }

    async fn kill(&self, name: &str) -> Result<(), SessionError> {
        // Ignore failure, the session might already be gone
        let mut cmd = Command::new("tmux");
        cmd.args(["kill-session", "-t", &exact(name)]);
        let _ = run_with_timeout(cmd, tmux_timeout(), "tmux kill-session").await;
        Ok(())
    }

    async fn set_environment(
        &self,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        tmux_run(
            &["set-environment", "-t", &exact(name), key, value],
            "tmux set-environment",
        )
        .await
    }

    async fn send_key(&self, name: &str, key: &str) -> Result<(), SessionError> {
        tmux_run(&["send-keys", "-t", &exact_pane(name), key], "tmux send-keys").await
    }

    async fn send_literal(&self, name: &str, text: &str) -> Result<(), SessionError> {
        // -l = literal mode (no key name interpretation)
        // -- = end of options (handles text starting with -)
        tmux_run(
            &["send-keys", "-t", &exact_pane(name), "-l", "--", text],
            "tmux send-keys literal",
        )
        .await
    }

    async fn send_enter(&self, name: &str) -> Result<(), SessionError> {
        tmux_run(
            &["send-keys", "-t", &exact_pane(name), "Enter"],
            "tmux send-keys enter",
        )
        .await
    }

    async fn configure(&self, name: &str, style: &SessionStyle) -> Result<(), SessionError> {
        if let Some(ref colour) = style.colour {
            tmux_set_option(name, "status-style", &format!("bg={},fg=white", colour)).await;
        }
        if let Some(ref title) = style.title {
            tmux_set_option(name, "set-titles", "on").await;
            tmux_set_option(name, "set-titles-string", title).await;
        }
        if let Some(ref left) = style.status_left {
            tmux_set_option(name, "status-left-length", "40").await;
            tmux_set_option(name, "status-left", &format!(" {} ", left)).await;
        }
        Ok(())
    }
}

/// Exact-match session target, so `wd-gastown` never resolves to `wd-gastown-monitor`.
fn exact(name: &str) -> String {
    format!("={}", name)
}

/// Exact-match pane target: the active pane of the named session.
fn exact_pane(name: &str) -> String {
    format!("={}:", name)
}

/// Run a tmux command, returning `NotFound` on failure (discards output).
async fn tmux_run(args: &[&str], description: &str) -> Result<(), SessionError> {
    tmux_output(args, description).await.map(|_| ())
}

/// Run a tmux command and return the output, returning `NotFound` on failure.
async fn tmux_output(
    args: &[&str],
    description: &str,
) -> Result<std::process::Output, SessionError> {
    let mut cmd = Command::new("tmux");
    cmd.args(args);
    let output = run_with_timeout(cmd, tmux_timeout(), description)
        .await
        .map_err(SessionError::CommandFailed)?;
    if !output.status.success() {
        let target = args
            .windows(2)
            .find(|w| w[0] == "-t")
            .map(|w| w[1].trim_start_matches('=').trim_end_matches(':'))
            .unwrap_or("unknown");
        return Err(SessionError::NotFound(target.to_string()));
    }
    Ok(output)
}

/// Set a tmux option (non-fatal, the session works even if styling fails).
async fn tmux_set_option(name: &str, option: &str, value: &str) {
    let mut cmd = Command::new("tmux");
    cmd.args(["set-option", "-t", &exact(name), option, value]);
    match run_with_timeout(cmd, tmux_timeout(), "tmux set-option").await {
        Ok(output) if !output.status.success() => {
            let stderr = stderr_of(&output);
            tracing::warn!(session = name, option, value, stderr = %stderr, "tmux set-option failed");
        }
        Err(e) => tracing::warn!(session = name, option, value, error = %e, "tmux set-option failed"),
        _ => {}
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
