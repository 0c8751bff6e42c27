// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relay triage.
//!
//! Deciding whether the relay needs waking is left to a disposable triage
//! agent started fresh each tick. Without tmux there is no agent to ask, so
//! a mechanical check stands in and records what it did.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use warden_adapters::{Mailbox, SessionAdapter, WorkLedger, WorkspaceSync};
use warden_core::{AgentIdentity, Clock};

use super::discovery::Liveness;
use super::start::{StartMode, StartOutcome};
use super::Supervisor;

/// Outcome of the last mechanical triage (`triage.json`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageStatus {
    pub running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// `start`, `nothing`, or `error`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TriageStatus {
    pub fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json)
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
    /// Run this tick's relay triage
    pub async fn ensure_watchdog_running(&self) {
        let triage = match self.roles.resolve(&AgentIdentity::triage()) {
            Ok(role) => role,
            Err(e) => {
                warn!(error = %e, "cannot resolve triage role, checking relay directly");
                self.ensure_relay_running().await;
                return;
            }
        };

        if self.liveness(&triage).await == Liveness::Running {
            info!("triage already running, skipping spawn");
            return;
        }

        if self.config.degraded || !self.sessions.is_available().await {
            info!("degraded mode: running mechanical triage");
            self.run_mechanical_triage().await;
            return;
        }

        // Triage is disposable; its directory is created on demand
        if let Err(e) = std::fs::create_dir_all(&triage.work_dir) {
            warn!(error = %e, "failed to create triage directory");
        }

        info!("spawning triage");
        match self.launch(&triage, StartMode::Start).await {
            Ok(_) => info!("triage spawned"),
            Err(e) => {
                warn!(error = %e, "triage spawn failed, falling back to direct relay check");
                self.ensure_relay_running().await;
            }
        }
    }

    /// Mechanical triage: start the relay if its session is gone.
    pub(crate) async fn run_mechanical_triage(&self) {
        let mut status = TriageStatus {
            running: true,
            started_at: Some(self.clock.utc_now()),
            ..TriageStatus::default()
        };

        let relay = AgentIdentity::relay();
        match self.roles.resolve(&relay) {
            Err(e) => {
                status.last_action = "error".to_string();
                status.error = Some(e.to_string());
            }
            Ok(role) => match self.sessions.has_session(&role.session_name).await {
                Err(e) => {
                    warn!(error = %e, "relay session check failed");
                    status.last_action = "error".to_string();
                    status.error = Some(e.to_string());
                }
                Ok(false) => {
                    info!("relay not running, starting");
                    self.ensure_relay_running().await;
                    status.last_action = "start".to_string();
                    status.target = Some(relay.to_string());
                }
                Ok(true) => status.last_action = "nothing".to_string(),
            },
        }

        status.running = false;
        status.completed_at = Some(self.clock.utc_now());
        if let Err(e) = status.save(&self.config.triage_path) {
            warn!(error = %e, "failed to save triage status");
        }
    }

    /// Start the relay unless it is already running
    pub(crate) async fn ensure_relay_running(&self) {
        match self
            .ensure_running(&AgentIdentity::relay(), StartMode::Start)
            .await
        {
            Ok(StartOutcome::AlreadyRunning) => {}
            Ok(StartOutcome::Started) => info!("relay started"),
            Err(e) => warn!(error = %e, "failed to start relay"),
        }
    }
}
