// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work ledger adapters

mod bd;

pub use bd::BdLedger;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLedger, LedgerCall};

use async_trait::async_trait;
use thiserror::Error;
use warden_core::{AgentIdentity, AgentRecord, PersistableState, RoleType};

/// Errors from work ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger command failed: {0}")]
    CommandFailed(String),
    #[error("ledger output unparseable: {0}")]
    Parse(String),
}

/// Durable per-agent records.
///
/// The write side only accepts [`PersistableState`]: liveness is never
/// stored, it is discovered from the session manager each time.
#[async_trait]
pub trait WorkLedger: Clone + Send + Sync + 'static {
    /// Fetch one agent's record, `None` if the ledger has none
    async fn agent_record(
        &self,
        identity: &AgentIdentity,
    ) -> Result<Option<AgentRecord>, LedgerError>;

    /// List agent records, optionally restricted to one role
    async fn list_agent_records(
        &self,
        role: Option<RoleType>,
    ) -> Result<Vec<AgentRecord>, LedgerError>;

    /// Record a state the session manager cannot observe
    async fn set_agent_state(
        &self,
        identity: &AgentIdentity,
        state: PersistableState,
    ) -> Result<(), LedgerError>;
}
