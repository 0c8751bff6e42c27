// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent start sequence shared by the watchdog, the crash scan, and
//! lifecycle requests.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};
use warden_adapters::{
    Mailbox, SessionAdapter, SessionError, SessionStyle, WorkLedger, WorkspaceSync,
};
use warden_core::{
    AgentIdentity, Clock, ProjectError, ProjectSettings, ResolvedRole, RoleError,
};

use super::discovery::Liveness;
use super::Supervisor;

/// Upper bound on waiting for the agent program after the start command
pub const READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Gap between the startup nudge and the propulsion nudge
pub const PROPULSION_DELAY: Duration = Duration::from_secs(2);

/// Why a session is being (re)created. Shown to the new agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    Start,
    Cycle,
    Restart,
    CrashRestart,
}

impl fmt::Display for StartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartMode::Start => write!(f, "start"),
            StartMode::Cycle => write!(f, "cycle"),
            StartMode::Restart => write!(f, "restart"),
            StartMode::CrashRestart => write!(f, "crash-restart"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Session and program were already up; nothing was touched
    AlreadyRunning,
    Started,
}

/// Errors from the start sequence
#[derive(Debug, Error)]
pub enum StartError {
    #[error("{project}: {reason}")]
    Blocked {
        project: String,
        reason: &'static str,
    },

    #[error(transparent)]
    Role(#[from] RoleError),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("working directory does not exist: {}", .0.display())]
    MissingWorkDir(PathBuf),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl<S, L, M, W, C> Supervisor<S, L, M, W, C>
where
    S: SessionAdapter,
    L: WorkLedger,
    M: Mailbox,
    W: WorkspaceSync,
    C: Clock,
{
    /// Make sure the agent is running, starting it if needed.
    ///
    /// Agents of parked or docked projects, or of projects with
    /// `auto_restart = false`, are never started here.
    pub async fn ensure_running(
        &self,
        identity: &AgentIdentity,
        mode: StartMode,
    ) -> Result<StartOutcome, StartError> {
        if let Some(project) = identity.project() {
            let settings = ProjectSettings::load(&self.config.root, project)?;
            if let Some(reason) = settings.blocked_reason() {
                return Err(StartError::Blocked {
                    project: project.to_string(),
                    reason,
                });
            }
        }

        let role = self.roles.resolve(identity)?;
        if self.liveness(&role).await == Liveness::Running {
            return Ok(StartOutcome::AlreadyRunning);
        }
        self.launch(&role, mode).await
    }

    /// Kill the agent's session if present, then start it fresh.
    pub async fn recreate(
        &self,
        identity: &AgentIdentity,
        mode: StartMode,
    ) -> Result<StartOutcome, StartError> {
        let role = self.roles.resolve(identity)?;
        if self.session_exists(&role.session_name).await {
            self.sessions.kill(&role.session_name).await?;
            info!(session = %role.session_name, "killed session for {}", mode);
        }
        self.launch(&role, mode).await
    }

    /// Create the session and bring the agent up in it.
    ///
    /// A zombie session is replaced. If the program turned out to be running
    /// after all (someone else won the race), nothing is touched.
    pub(crate) async fn launch(
        &self,
        role: &ResolvedRole,
        mode: StartMode,
    ) -> Result<StartOutcome, StartError> {
        let name = role.session_name.as_str();
        if !role.work_dir.is_dir() {
            return Err(StartError::MissingWorkDir(role.work_dir.clone()));
        }

        // A crashed worker may have lost its place; sync it before resuming
        if role.needs_pre_sync || mode == StartMode::CrashRestart {
            info!(agent = %role.identity, work_dir = %role.work_dir.display(), "pre-syncing workspace");
            if let Err(e) = self.sync.sync(&role.work_dir).await {
                warn!(agent = %role.identity, error = %e, "pre-sync failed, starting anyway");
            }
        }

        match self
            .sessions
            .ensure_fresh(name, &role.work_dir, &role.program)
            .await
        {
            Ok(()) => {}
            Err(SessionError::AlreadyExists(_)) => return Ok(StartOutcome::AlreadyRunning),
            Err(e) => return Err(e.into()),
        }

        for (key, value) in &role.env {
            self.sessions.set_environment(name, key, value).await?;
        }

        let style = SessionStyle {
            colour: role.theme.clone(),
            title: Some(role.identity.address()),
            status_left: Some(format!("{} ", role.identity)),
        };
        if let Err(e) = self.sessions.configure(name, &style).await {
            warn!(session = name, error = %e, "failed to apply theme");
        }

        self.sessions.send_keys(name, &role.start_command).await?;

        if !self.wait_for_program(role, READY_TIMEOUT).await {
            // The program may still come up; the next tick will tell
            warn!(session = name, program = %role.program, "agent program not ready yet");
        }

        let startup = self.startup_nudge(&role.identity, mode);
        if let Err(e) = self.sessions.nudge(name, &startup).await {
            warn!(session = name, error = %e, "startup nudge failed");
        }
        tokio::time::sleep(PROPULSION_DELAY).await;
        if let Err(e) = self.sessions.nudge(name, &role.propulsion).await {
            warn!(session = name, error = %e, "propulsion nudge failed");
        }

        info!(agent = %role.identity, session = name, %mode, "agent started");
        Ok(StartOutcome::Started)
    }

    /// First thing a new session sees: who started it, when, and why.
    /// Lets the agent find its predecessor's handoff.
    pub(crate) fn startup_nudge(&self, identity: &AgentIdentity, mode: StartMode) -> String {
        format!(
            "[warden] {} <- supervisor • {} • {}",
            identity.address(),
            self.clock.utc_now().to_rfc3339(),
            mode
        )
    }
}
