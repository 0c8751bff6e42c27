// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Violation scans over the work ledger: stalled hooks (GUPP), work left on
//! dead agents, and crashed workers.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use warden_adapters::{Mailbox, SessionAdapter, WorkLedger, WorkspaceSync};
use warden_core::{
    format_signed_age, AgentIdentity, AgentRecord, AgentState, Clock, PersistableState, RoleType,
};

use super::start::{StartError, StartMode};
use super::{as_signed, Supervisor};

/// Work on a hook with no record update for longer than this is a violation
pub const GUPP_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const ORPHAN_KEY_PREFIX: &str = "orphan:";
const CRASH_KEY_PREFIX: &str = "crash:";

impl<S, L, M, W, C> Supervisor<S, L, M, W, C>
where
    S: SessionAdapter,
    L: WorkLedger,
    M: Mailbox,
    W: WorkspaceSync,
    C: Clock,
{
    async fn records(&self, role: Option<RoleType>) -> Option<Vec<AgentRecord>> {
        match self.ledger.list_agent_records(role).await {
            Ok(records) => Some(records),
            Err(e) => {
                warn!(error = %e, "failed to list agent records");
                None
            }
        }
    }

    /// Report workers sitting on a hook without progress.
    ///
    /// The worker is marked stuck once its monitor has been told, so the
    /// violation is reported once rather than every tick. Nothing is
    /// restarted.
    pub async fn scan_gupp_violations(&self) {
        let Some(workers) = self.records(Some(RoleType::Worker)).await else {
            return;
        };
        let now = self.clock.utc_now();
        let timeout = as_signed(GUPP_TIMEOUT);

        for record in &workers {
            let Some(hook) = record.hook() else {
                continue;
            };
            if !AgentState::is_active(record.state) {
                continue;
            }
            let age = now.signed_duration_since(record.updated_at);
            if age <= timeout {
                continue;
            }

            let address = record.identity.address();
            let age_text = format_signed_age(age);
            warn!(agent = %record.identity, hook, age = %age_text, "GUPP violation");

            let subject = format!("GUPP_VIOLATION: {} has work on hook for {}", address, age_text);
            let body = format!(
                "Worker {} has had work on its hook for {} without progress.\n\n\
                 hook_bead: {}\n\
                 updated_at: {}\n\n\
                 It has been marked stuck.",
                address,
                age_text,
                hook,
                record.updated_at.to_rfc3339(),
            );
            let monitor = record.identity.monitor_address();
            if let Err(e) = self.mail.send(&monitor, &subject, &body).await {
                // Not marked stuck, so the next tick reports it again
                warn!(agent = %record.identity, error = %e, "failed to notify monitor");
                continue;
            }
            if let Err(e) = self
                .ledger
                .set_agent_state(&record.identity, PersistableState::Stuck)
                .await
            {
                warn!(agent = %record.identity, error = %e, "failed to mark stuck");
            }
        }
    }

    /// Tell monitors about work attached to dead agents.
    pub async fn scan_orphaned_work(&mut self) {
        let Some(records) = self.records(None).await else {
            return;
        };
        let now = self.clock.now();
        let mut orphaned = HashSet::new();

        for record in &records {
            if record.state != Some(AgentState::Dead) {
                continue;
            }
            let Some(hook) = record.hook() else {
                continue;
            };
            let key = format!("{}{}", ORPHAN_KEY_PREFIX, record.id());
            orphaned.insert(key.clone());
            if !self.backoff.ready(&key, now) {
                debug!(agent = %record.identity, "orphaned work notification backed off");
                continue;
            }

            let address = record.identity.address();
            warn!(agent = %record.identity, hook, "orphaned work");
            let subject = format!("ORPHANED_WORK: {} is dead with work attached", address);
            let body = format!(
                "Agent {} is dead but still has work on its hook.\n\n\
                 hook_bead: {}\n\n\
                 Reassign the work or restart the agent.",
                address, hook,
            );
            let monitor = record.identity.monitor_address();
            match self.mail.send(&monitor, &subject, &body).await {
                Ok(()) => self.backoff.record(&key, now),
                Err(e) => warn!(agent = %record.identity, error = %e, "failed to notify monitor"),
            }
        }

        // Orphans that were resolved start from scratch next time
        self.backoff
            .retain_prefixed(ORPHAN_KEY_PREFIX, |key| orphaned.contains(key));
    }

    /// Restart workers whose session vanished while they held work.
    pub async fn scan_crashed_workers(&mut self) {
        let Some(workers) = self.records(Some(RoleType::Worker)).await else {
            return;
        };
        let now = self.clock.now();
        let mut crashed = HashSet::new();

        for record in &workers {
            let Some(hook) = record.hook() else {
                continue;
            };
            let role = match self.roles.resolve(&record.identity) {
                Ok(role) => role,
                Err(e) => {
                    warn!(agent = %record.identity, error = %e, "cannot resolve role");
                    continue;
                }
            };
            match self.sessions.has_session(&role.session_name).await {
                Ok(false) => {}
                Ok(true) => continue,
                Err(e) => {
                    warn!(session = %role.session_name, error = %e, "session check failed");
                    continue;
                }
            }

            error!(
                agent = %record.identity,
                hook,
                session = %role.session_name,
                "crash detected: worker has work on hook but no session"
            );
            match self
                .ensure_running(&record.identity, StartMode::CrashRestart)
                .await
            {
                Ok(_) => info!(agent = %record.identity, "restarted crashed worker"),
                Err(e) => {
                    error!(agent = %record.identity, error = %e, "failed to restart crashed worker");
                    let key = format!("{}{}", CRASH_KEY_PREFIX, record.id());
                    crashed.insert(key.clone());
                    if self.backoff.ready(&key, now) {
                        self.notify_crashed_worker(&record.identity, hook, &e).await;
                        self.backoff.record(&key, now);
                    }
                }
            }
        }

        self.backoff
            .retain_prefixed(CRASH_KEY_PREFIX, |key| crashed.contains(key));
    }

    async fn notify_crashed_worker(&self, identity: &AgentIdentity, hook: &str, err: &StartError) {
        let subject = format!(
            "CRASHED_WORKER: {}/{} restart failed",
            identity.project, identity.name
        );
        let body = format!(
            "Worker {} crashed and automatic restart failed.\n\n\
             hook_bead: {}\n\
             restart_error: {}\n\n\
             Manual intervention may be required.",
            identity.name, hook, err,
        );
        if let Err(e) = self
            .mail
            .send(&identity.monitor_address(), &subject, &body)
            .await
        {
            warn!(agent = %identity, error = %e, "failed to notify monitor of crashed worker");
        }
    }
}
