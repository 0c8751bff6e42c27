// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending worker spawns.
//!
//! Whoever spawns a worker mails `WORKER_STARTED: <project>/<name>` to the
//! relay inbox. Once the worker's program is up, it gets its propulsion
//! nudge and the announcement is removed.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use warden_adapters::{Mailbox, SessionAdapter, WorkLedger, WorkspaceSync};
use warden_core::{is_valid_agent_name, AgentIdentity, Clock, Message, RoleType};

use super::{as_signed, Supervisor};

/// Subject prefix of a spawn announcement
pub const WORKER_STARTED_MARKER: &str = "WORKER_STARTED:";

/// Announcements older than this are pruned; the session likely died
pub const SPAWN_MAX_AGE: Duration = Duration::from_secs(5 * 60);

/// Kept short so a slow worker cannot hold up the heartbeat
const SPAWN_READY_TIMEOUT: Duration = Duration::from_secs(2);

/// A worker whose start was announced but not yet triggered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSpawn {
    pub message_id: String,
    pub worker: AgentIdentity,
    pub announced_at: Option<DateTime<Utc>>,
}

impl PendingSpawn {
    /// Parse an announcement; anything else is `None`.
    pub fn from_message(msg: &Message) -> Option<Self> {
        let rest = msg.subject.trim().strip_prefix(WORKER_STARTED_MARKER)?.trim();
        let worker = match rest.split('/').collect::<Vec<_>>().as_slice() {
            [project, name] if !project.is_empty() && is_valid_agent_name(name) => {
                AgentIdentity::worker(*project, *name)
            }
            _ => AgentIdentity::parse(rest)
                .ok()
                .filter(|id| id.role == RoleType::Worker)?,
        };
        Some(Self {
            message_id: msg.id.clone(),
            worker,
            announced_at: msg.created_at,
        })
    }

    /// Announcements without a timestamp never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.announced_at
            .is_some_and(|at| now.signed_duration_since(at) > as_signed(SPAWN_MAX_AGE))
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
    /// Nudge announced workers whose program is up; prune stale announcements
    pub async fn trigger_pending_spawns(&self) {
        let inbox = AgentIdentity::relay().address();
        let pending: Vec<PendingSpawn> = match self.mail.inbox(&inbox).await {
            Ok(messages) => messages
                .iter()
                .filter(|msg| !msg.is_closed())
                .filter_map(PendingSpawn::from_message)
                .collect(),
            Err(e) => {
                warn!(error = %e, "failed to check pending spawns");
                return;
            }
        };
        if pending.is_empty() {
            return;
        }
        info!(count = pending.len(), "found pending spawns");

        let now = self.clock.utc_now();
        let (mut triggered, mut pruned) = (0, 0);
        for spawn in &pending {
            if spawn.is_expired(now) {
                match self.mail.delete(&spawn.message_id).await {
                    Ok(()) => pruned += 1,
                    Err(e) => warn!(id = %spawn.message_id, error = %e, "failed to prune pending spawn"),
                }
                continue;
            }

            let role = match self.roles.resolve(&spawn.worker) {
                Ok(role) => role,
                Err(e) => {
                    warn!(agent = %spawn.worker, error = %e, "cannot resolve role");
                    continue;
                }
            };
            if !self.wait_for_program(&role, SPAWN_READY_TIMEOUT).await {
                debug!(agent = %spawn.worker, "worker not ready yet");
                continue;
            }
            if let Err(e) = self.sessions.nudge(&role.session_name, &role.propulsion).await {
                warn!(agent = %spawn.worker, error = %e, "failed to trigger worker");
                continue;
            }
            triggered += 1;
            info!(agent = %spawn.worker, "triggered worker");
            if let Err(e) = self.mail.delete(&spawn.message_id).await {
                warn!(id = %spawn.message_id, error = %e, "failed to remove spawn announcement");
            }
        }

        if triggered > 0 || pruned > 0 {
            info!(triggered, pruned, total = pending.len(), "pending spawns processed");
        }
    }
}
