// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work ledger backed by the `bd` command line tool

use super::{LedgerError, WorkLedger};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use warden_core::{AgentIdentity, AgentRecord, AgentState, PersistableState, RoleType};

/// Label carried by every agent record in the ledger.
pub const AGENT_LABEL: &str = "warden:agent";

/// `bd` adapter rooted at the deployment directory.
#[derive(Clone)]
pub struct BdLedger {
    root: PathBuf,
}

impl BdLedger {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn run(&self, args: &[&str]) -> Result<Option<Vec<u8>>, LedgerError> {
        crate::bd::run(&self.root, args)
            .await
            .map_err(LedgerError::CommandFailed)
    }
}

/// The agent-relevant slice of a ledger issue.
#[derive(Debug, Deserialize)]
pub(crate) struct AgentIssue {
    pub id: String,
    #[serde(default)]
    pub agent_state: Option<String>,
    #[serde(default)]
    pub hook_bead: Option<String>,
    #[serde(default)]
    pub role_bead: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl AgentIssue {
    /// Convert to a record. Issues whose id is not an agent identity, or
    /// which carry no timestamp at all, yield `None`.
    pub(crate) fn into_record(self) -> Option<AgentRecord> {
        let identity = match AgentIdentity::from_record_id(&self.id) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::debug!(id = %self.id, error = %e, "skipping non-agent record");
                return None;
            }
        };
        let updated_at = self.updated_at.or(self.created_at)?;
        let state = self
            .agent_state
            .filter(|s| !s.is_empty())
            .map(|s| parse_state(&s));
        Some(AgentRecord {
            identity,
            state,
            hook_bead: self.hook_bead.filter(|h| !h.is_empty()),
            role_bead: self.role_bead.filter(|r| !r.is_empty()),
            updated_at,
        })
    }
}

fn parse_state(raw: &str) -> AgentState {
    serde_json::from_value(serde_json::Value::String(raw.to_ascii_lowercase()))
        .unwrap_or(AgentState::Unknown)
}

pub(crate) fn parse_issues(stdout: &[u8]) -> Result<Vec<AgentIssue>, LedgerError> {
    serde_json::from_slice(stdout).map_err(|e| LedgerError::Parse(e.to_string()))
}

#[async_trait]
impl WorkLedger for BdLedger {
    async fn agent_record(
        &self,
        identity: &AgentIdentity,
    ) -> Result<Option<AgentRecord>, LedgerError> {
        let id = identity.record_id();
        let Some(stdout) = self.run(&["show", &id, "--json"]).await? else {
            return Ok(None);
        };
        // `bd show --json` returns an array with one element
        Ok(parse_issues(&stdout)?
            .into_iter()
            .next()
            .and_then(AgentIssue::into_record))
    }

    async fn list_agent_records(
        &self,
        role: Option<RoleType>,
    ) -> Result<Vec<AgentRecord>, LedgerError> {
        let label = format!("--label={}", AGENT_LABEL);
        let Some(stdout) = self.run(&["list", "--json", &label]).await? else {
            return Ok(Vec::new());
        };
        Ok(parse_issues(&stdout)?
            .into_iter()
            .filter_map(AgentIssue::into_record)
            .filter(|record| role.is_none_or(|r| record.identity.role == r))
            .collect())
    }

    async fn set_agent_state(
        &self,
        identity: &AgentIdentity,
        state: PersistableState,
    ) -> Result<(), LedgerError> {
        let id = identity.record_id();
        let state = state.to_string();
        match self.run(&["agent", "state", &id, &state]).await? {
            Some(_) => Ok(()),
            None => Err(LedgerError::CommandFailed(format!(
                "agent record {} not found",
                id
            ))),
        }
    }
}

#[cfg(test)]
#[path = "bd_tests.rs"]
mod tests;
