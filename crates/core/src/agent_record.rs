// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work ledger agent records.
//!
//! An [`AgentRecord`] describes what an agent is supposed to be doing. It has
//! no notion of whether the agent's process is alive: liveness is always
//! discovered from the session manager at the moment it is needed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::AgentIdentity;

/// State an agent reports about itself, or a non-observable state set by
/// an operator or the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentState {
    Spawning,
    Working,
    Done,
    Dead,
    Stuck,
    AwaitingGate,
    Muted,
    Paused,
    #[serde(other)]
    Unknown,
}

impl AgentState {
    /// States in which an agent holding work is expected to be progressing it.
    pub fn is_active(state: Option<AgentState>) -> bool {
        matches!(
            state,
            None | Some(AgentState::Spawning) | Some(AgentState::Working)
        )
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentState::Spawning => write!(f, "spawning"),
            AgentState::Working => write!(f, "working"),
            AgentState::Done => write!(f, "done"),
            AgentState::Dead => write!(f, "dead"),
            AgentState::Stuck => write!(f, "stuck"),
            AgentState::AwaitingGate => write!(f, "awaiting-gate"),
            AgentState::Muted => write!(f, "muted"),
            AgentState::Paused => write!(f, "paused"),
            AgentState::Unknown => write!(f, "unknown"),
        }
    }
}

/// The only states the supervisor may write to the ledger.
///
/// None of these can be derived by looking at a session, which is what
/// makes them safe to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersistableState {
    Stuck,
    AwaitingGate,
    Muted,
    Paused,
}

impl From<PersistableState> for AgentState {
    fn from(state: PersistableState) -> Self {
        match state {
            PersistableState::Stuck => AgentState::Stuck,
            PersistableState::AwaitingGate => AgentState::AwaitingGate,
            PersistableState::Muted => AgentState::Muted,
            PersistableState::Paused => AgentState::Paused,
        }
    }
}

impl fmt::Display for PersistableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        AgentState::from(*self).fmt(f)
    }
}

/// Durable per-agent record held by the work ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub identity: AgentIdentity,
    #[serde(default)]
    pub state: Option<AgentState>,
    /// Work item currently assigned to the agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_bead: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_bead: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl AgentRecord {
    pub fn new(identity: AgentIdentity, updated_at: DateTime<Utc>) -> Self {
        Self {
            identity,
            state: None,
            hook_bead: None,
            role_bead: None,
            updated_at,
        }
    }

    pub fn with_state(mut self, state: AgentState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_hook(mut self, bead: impl Into<String>) -> Self {
        self.hook_bead = Some(bead.into());
        self
    }

    /// Ledger id for this record.
    pub fn id(&self) -> String {
        self.identity.record_id()
    }

    /// Assigned work item, ignoring empty strings.
    pub fn hook(&self) -> Option<&str> {
        self.hook_bead.as_deref().filter(|h| !h.trim().is_empty())
    }
}

#[cfg(test)]
#[path = "agent_record_tests.rs"]
mod tests;
