// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

use super::start::PROPULSION_DELAY;
use super::watchdog::HEALTH_CHECK_NUDGE;
use crate::test_helpers::{setup, TestContext};
use warden_adapters::{LedgerCall, SentMail, SessionCall};
use warden_core::{
    AgentIdentity, AgentRecord, AgentState, LifecycleAction, LifecycleRequest, Message,
    PersistableState,
};

mod detectors;
mod discovery;
mod requests;
mod run_loop;
mod spawns;
mod start;
mod triage;
mod watchdog;

fn minutes(m: i64) -> chrono::Duration {
    chrono::Duration::minutes(m)
}

/// Literal text sent to a session after its start command, i.e. its nudges
fn nudges(ctx: &TestContext, session: &str) -> Vec<String> {
    ctx.sessions.literals(session).into_iter().skip(1).collect()
}

/// When each literal was sent to a session, in tokio time
fn literal_times(ctx: &TestContext, session: &str) -> Vec<tokio::time::Instant> {
    ctx.sessions
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            SessionCall::SendLiteral { name, at, .. } if name == session => Some(at),
            _ => None,
        })
        .collect()
}

fn subjects(sent: &[SentMail]) -> Vec<&str> {
    sent.iter().map(|m| m.subject.as_str()).collect()
}

/// A worker holding `gt-123`, last updated `age` ago
fn hooked_worker(ctx: &TestContext, name: &str, state: AgentState, age: chrono::Duration) -> AgentRecord {
    AgentRecord::new(AgentIdentity::worker("gastown", name), ctx.clock.utc_now() - age)
        .with_state(state)
        .with_hook("gt-123")
}

/// A lifecycle request as an agent would send it
fn lifecycle_message(
    ctx: &TestContext,
    id: &str,
    from: &AgentIdentity,
    action: LifecycleAction,
    age: chrono::Duration,
) -> Message {
    Message::new(id, LifecycleRequest::subject(from, action))
        .with_body(LifecycleRequest::body(from, action))
        .with_sender(from.address())
        .sent_at(ctx.clock.utc_now() - age)
}

fn state_writes(ctx: &TestContext) -> Vec<(AgentIdentity, PersistableState)> {
    ctx.ledger
        .calls()
        .into_iter()
        .map(|call| match call {
            LedgerCall::SetState { identity, state } => (identity, state),
        })
        .collect()
}
