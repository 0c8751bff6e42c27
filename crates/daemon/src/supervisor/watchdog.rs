// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hierarchical watchdog: the relay's heartbeat file, and the per-project
//! monitors and mergers.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use warden_adapters::{Mailbox, SessionAdapter, WorkLedger, WorkspaceSync};
use warden_core::{format_signed_age, AgentIdentity, Clock};

use super::start::{StartError, StartMode, StartOutcome};
use super::{as_signed, Supervisor};

/// A heartbeat younger than this is healthy
pub const HEARTBEAT_STALE_AFTER: Duration = Duration::from_secs(15 * 60);

/// A heartbeat older than this means the relay is stuck and gets killed
pub const HEARTBEAT_KILL_AFTER: Duration = Duration::from_secs(30 * 60);

pub const HEALTH_CHECK_NUDGE: &str =
    "HEALTH_CHECK: heartbeat stale, respond to confirm responsiveness";

const RELAY_HEALTH_KEY: &str = "relay:health-check";

/// Written by the relay on every patrol cycle (`relay/heartbeat.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayHeartbeat {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub cycle: u64,
    #[serde(default)]
    pub last_action: String,
}

impl RelayHeartbeat {
    /// Read the heartbeat file. Missing or unreadable files are `None`.
    pub fn read(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(heartbeat) => Some(heartbeat),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable relay heartbeat");
                None
            }
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.timestamp)
    }
}

impl<S, L, M, W, C> Supervisor<S, L, M, W, C>
where
    S: SessionAdapter,
    L: WorkLedger,
    M: Mailbox,
    W: WorkspaceSync,
    C: Clock,
{
    /// Check the relay is making progress, independent of triage.
    pub async fn check_relay_heartbeat(&mut self) {
        let Some(heartbeat) = RelayHeartbeat::read(&self.config.heartbeat_path) else {
            // Relay hasn't started a cycle yet
            return;
        };

        let age = heartbeat.age(self.clock.utc_now());
        let stale = as_signed(HEARTBEAT_STALE_AFTER);
        if age < stale {
            self.backoff.reset(RELAY_HEALTH_KEY);
            return;
        }
        warn!(age = %format_signed_age(age), "relay heartbeat is stale, checking session");

        let role = match self.roles.resolve(&AgentIdentity::relay()) {
            Ok(role) => role,
            Err(e) => {
                warn!(error = %e, "cannot resolve relay role");
                return;
            }
        };
        if !self.session_exists(&role.session_name).await {
            info!("relay session absent, triage will restart it");
            return;
        }

        let kill_after = as_signed(HEARTBEAT_KILL_AFTER);
        if age > kill_after {
            warn!(age = %format_signed_age(age), "relay appears stuck, killing session");
            match self.sessions.kill(&role.session_name).await {
                // Restarted on the next tick
                Ok(()) => self.backoff.reset(RELAY_HEALTH_KEY),
                Err(e) => warn!(error = %e, "failed to kill relay session"),
            }
            return;
        }

        let now = self.clock.now();
        if !self.backoff.ready(RELAY_HEALTH_KEY, now) {
            debug!("relay health check backed off");
            return;
        }
        match self
            .sessions
            .nudge(&role.session_name, HEALTH_CHECK_NUDGE)
            .await
        {
            Ok(()) => self.backoff.record(RELAY_HEALTH_KEY, now),
            Err(e) => warn!(error = %e, "relay health check nudge failed"),
        }
    }

    pub async fn ensure_monitors_running(&self, projects: &[String]) {
        for project in projects {
            self.ensure_project_agent(&AgentIdentity::monitor(project))
                .await;
        }
    }

    pub async fn ensure_mergers_running(&self, projects: &[String]) {
        for project in projects {
            self.ensure_project_agent(&AgentIdentity::merger(project))
                .await;
        }
    }

    async fn ensure_project_agent(&self, identity: &AgentIdentity) {
        match self.ensure_running(identity, StartMode::Start).await {
            Ok(StartOutcome::AlreadyRunning) => {}
            Ok(StartOutcome::Started) => info!(agent = %identity, "started"),
            Err(StartError::Blocked { reason, .. }) => {
                debug!(agent = %identity, reason, "skipping start");
            }
            Err(e) => warn!(agent = %identity, error = %e, "failed to start"),
        }
    }
}
