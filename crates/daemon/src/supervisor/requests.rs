// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle requests: agents asking to be cycled, restarted, or shut down.
//!
//! Claim then execute: a request is deleted from the inbox before anything
//! happens to the session. A crash in between loses the request (the agent
//! can ask again) but never runs it twice.

use tracing::{error, info, warn};
use warden_adapters::{Mailbox, SessionAdapter, WorkLedger, WorkspaceSync};
use warden_core::{AgentIdentity, Clock, LifecycleAction, LifecycleRequest, Message};

use super::start::{StartError, StartMode};
use super::Supervisor;

impl<S, L, M, W, C> Supervisor<S, L, M, W, C>
where
    S: SessionAdapter,
    L: WorkLedger,
    M: Mailbox,
    W: WorkspaceSync,
    C: Clock,
{
    /// Drain lifecycle requests from the relay inbox
    pub async fn process_lifecycle_requests(&self) {
        let inbox = AgentIdentity::relay().address();
        let messages = match self.mail.inbox(&inbox).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(error = %e, "failed to read lifecycle inbox");
                return;
            }
        };

        for msg in messages {
            if msg.is_closed() || !LifecycleRequest::is_lifecycle_message(&msg) {
                continue;
            }
            self.handle_lifecycle_message(&msg).await;
        }
    }

    async fn handle_lifecycle_message(&self, msg: &Message) {
        let now = self.clock.utc_now();
        let request = match LifecycleRequest::from_message(msg, now) {
            Ok(request) => request,
            Err(e) => {
                warn!(id = %msg.id, subject = %msg.subject, error = %e, "discarding unparseable lifecycle request");
                self.discard(msg).await;
                return;
            }
        };

        if request.is_stale(now) {
            warn!(
                id = %msg.id,
                from = %request.from,
                action = %request.action,
                sent_at = %request.timestamp.to_rfc3339(),
                "discarding stale lifecycle request"
            );
            self.discard(msg).await;
            return;
        }

        // Claim
        if let Err(e) = self.mail.delete(&msg.id).await {
            warn!(id = %msg.id, error = %e, "failed to claim lifecycle request, not executing");
            return;
        }

        info!(from = %request.from, action = %request.action, "processing lifecycle request");
        if let Err(e) = self.execute_lifecycle(&request).await {
            error!(from = %request.from, action = %request.action, error = %e, "lifecycle action failed");
        }
    }

    async fn discard(&self, msg: &Message) {
        if let Err(e) = self.mail.delete(&msg.id).await {
            warn!(id = %msg.id, error = %e, "failed to delete lifecycle request");
        }
    }

    /// Execute a claimed request
    pub async fn execute_lifecycle(&self, request: &LifecycleRequest) -> Result<(), StartError> {
        match request.action {
            LifecycleAction::Shutdown => {
                let role = self.roles.resolve(&request.from)?;
                if self.session_exists(&role.session_name).await {
                    self.sessions.kill(&role.session_name).await?;
                    info!(session = %role.session_name, "killed session");
                }
                Ok(())
            }
            LifecycleAction::Cycle | LifecycleAction::Restart => {
                let mode = if request.action == LifecycleAction::Cycle {
                    StartMode::Cycle
                } else {
                    StartMode::Restart
                };
                self.recreate(&request.from, mode).await?;
                info!(agent = %request.from, "restarted session");
                Ok(())
            }
        }
    }
}
