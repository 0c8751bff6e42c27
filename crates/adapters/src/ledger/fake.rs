// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake work ledger for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LedgerError, WorkLedger};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use warden_core::{AgentIdentity, AgentRecord, PersistableState, RoleType};

/// Recorded ledger write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    SetState {
        identity: AgentIdentity,
        state: PersistableState,
    },
}

#[derive(Default)]
struct FakeLedgerState {
    records: BTreeMap<String, AgentRecord>,
    calls: Vec<LedgerCall>,
    fail_reads: bool,
}

/// In-memory work ledger keyed by record id
#[derive(Clone, Default)]
pub struct FakeLedger {
    inner: Arc<Mutex<FakeLedgerState>>,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record
    pub fn put(&self, record: AgentRecord) {
        self.inner.lock().records.insert(record.id(), record);
    }

    pub fn get(&self, identity: &AgentIdentity) -> Option<AgentRecord> {
        self.inner.lock().records.get(&identity.record_id()).cloned()
    }

    /// Make reads fail as if the ledger were unreachable
    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.lock().fail_reads = fail;
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl WorkLedger for FakeLedger {
    async fn agent_record(
        &self,
        identity: &AgentIdentity,
    ) -> Result<Option<AgentRecord>, LedgerError> {
        let inner = self.inner.lock();
        if inner.fail_reads {
            return Err(LedgerError::CommandFailed("ledger unavailable".to_string()));
        }
        Ok(inner.records.get(&identity.record_id()).cloned())
    }

    async fn list_agent_records(
        &self,
        role: Option<RoleType>,
    ) -> Result<Vec<AgentRecord>, LedgerError> {
        let inner = self.inner.lock();
        if inner.fail_reads {
            return Err(LedgerError::CommandFailed("ledger unavailable".to_string()));
        }
        Ok(inner
            .records
            .values()
            .filter(|r| role.is_none_or(|role| r.identity.role == role))
            .cloned()
            .collect())
    }

    async fn set_agent_state(
        &self,
        identity: &AgentIdentity,
        state: PersistableState,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(LedgerCall::SetState {
            identity: identity.clone(),
            state,
        });
        let record = inner
            .records
            .get_mut(&identity.record_id())
            .ok_or_else(|| LedgerError::CommandFailed(format!("no record {}", identity)))?;
        record.state = Some(state.into());
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
