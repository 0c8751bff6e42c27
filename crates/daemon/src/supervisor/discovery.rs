// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness discovery: ask tmux, every time.
//!
//! Query errors count as "not alive" for the decision at hand and are never
//! written anywhere.

use std::time::Duration;

use tracing::warn;
use warden_adapters::{Mailbox, SessionAdapter, WorkLedger, WorkspaceSync};
use warden_core::{AgentIdentity, Clock, ResolvedRole};

use super::Supervisor;

/// Poll interval while waiting for an agent program to come up
const READY_POLL: Duration = Duration::from_millis(250);

/// Observable state of an agent's session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// No session
    Absent,
    /// Session exists but the agent program has exited
    Zombie,
    Running,
}

impl<S, L, M, W, C> Supervisor<S, L, M, W, C>
where
    S: SessionAdapter,
    L: WorkLedger,
    M: Mailbox,
    W: WorkspaceSync,
    C: Clock,
{
    /// Whether the agent's session exists
    pub async fn is_alive(&self, identity: &AgentIdentity) -> bool {
        match self.roles.resolve(identity) {
            Ok(role) => self.session_exists(&role.session_name).await,
            Err(e) => {
                warn!(agent = %identity, error = %e, "cannot resolve role");
                false
            }
        }
    }

    /// Whether the agent program is running inside its session
    pub async fn is_program_running(&self, identity: &AgentIdentity) -> bool {
        match self.roles.resolve(identity) {
            Ok(role) => self.liveness(&role).await == Liveness::Running,
            Err(e) => {
                warn!(agent = %identity, error = %e, "cannot resolve role");
                false
            }
        }
    }

    pub async fn liveness(&self, role: &ResolvedRole) -> Liveness {
        if !self.session_exists(&role.session_name).await {
            return Liveness::Absent;
        }
        match self
            .sessions
            .is_program_running(&role.session_name, &role.program)
            .await
        {
            Ok(true) => Liveness::Running,
            Ok(false) => Liveness::Zombie,
            Err(e) => {
                warn!(session = %role.session_name, error = %e, "program check failed");
                Liveness::Zombie
            }
        }
    }

    pub(crate) async fn session_exists(&self, name: &str) -> bool {
        match self.sessions.has_session(name).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(session = name, error = %e, "session check failed");
                false
            }
        }
    }

    /// Poll until the agent program is running or `timeout` passes
    pub(crate) async fn wait_for_program(&self, role: &ResolvedRole, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.liveness(role).await == Liveness::Running {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(READY_POLL).await;
        }
    }
}
