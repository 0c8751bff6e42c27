// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake session adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SessionAdapter, SessionError, SessionStyle};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::Instant;

/// Recorded session call
#[derive(Debug, Clone)]
pub enum SessionCall {
    Create {
        name: String,
        cwd: PathBuf,
    },
    Kill {
        name: String,
    },
    SetEnvironment {
        name: String,
        key: String,
        value: String,
    },
    SendKey {
        name: String,
        key: String,
    },
    SendLiteral {
        name: String,
        text: String,
        /// Tokio time, so paused-clock tests can measure gaps
        at: Instant,
    },
    SendEnter {
        name: String,
    },
    Configure {
        name: String,
        style: SessionStyle,
    },
}

/// Fake session state
#[derive(Debug, Clone)]
pub struct FakeSession {
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    pub program_running: bool,
    pub style: Option<SessionStyle>,
}

struct FakeSessionState {
    sessions: HashMap<String, FakeSession>,
    calls: Vec<SessionCall>,
    available: bool,
    programs_start: bool,
    fail_create: Option<String>,
}

/// Fake session adapter for testing
///
/// Created sessions report their program as running unless
/// [`FakeSessionAdapter::set_programs_start`] turned that off.
#[derive(Clone)]
pub struct FakeSessionAdapter {
    inner: Arc<Mutex<FakeSessionState>>,
}

impl Default for FakeSessionAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeSessionState {
                sessions: HashMap::new(),
                calls: Vec::new(),
                available: true,
                programs_start: true,
                fail_create: None,
            })),
        }
    }
}

impl FakeSessionAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<SessionCall> {
        self.inner.lock().calls.clone()
    }

    /// Forget recorded calls, keeping sessions
    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Get a session by name
    pub fn get_session(&self, name: &str) -> Option<FakeSession> {
        self.inner.lock().sessions.get(name).cloned()
    }

    /// Add a pre-existing session
    pub fn add_session(&self, name: &str, program_running: bool) {
        self.inner.lock().sessions.insert(
            name.to_string(),
            FakeSession {
                cwd: PathBuf::new(),
                env: Vec::new(),
                program_running,
                style: None,
            },
        );
    }

    /// Remove a session as if it crashed
    pub fn remove_session(&self, name: &str) {
        self.inner.lock().sessions.remove(name);
    }

    /// Set whether the agent program is running in the session
    pub fn set_program_running(&self, name: &str, running: bool) {
        if let Some(session) = self.inner.lock().sessions.get_mut(name) {
            session.program_running = running;
        }
    }

    /// Whether newly created sessions report a running program
    pub fn set_programs_start(&self, start: bool) {
        self.inner.lock().programs_start = start;
    }

    pub fn set_available(&self, available: bool) {
        self.inner.lock().available = available;
    }

    /// Make every subsequent `create` fail with the given message
    pub fn fail_create(&self, message: Option<&str>) {
        self.inner.lock().fail_create = message.map(str::to_string);
    }

    /// Text sent with `send_literal`, in order, per session
    pub fn literals(&self, name: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SessionCall::SendLiteral { name: n, text, .. } if n == name => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Number of `create` calls for a session
    pub fn create_count(&self, name: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, SessionCall::Create { name: n, .. } if n == name))
            .count()
    }

    /// Number of `kill` calls for a session
    pub fn kill_count(&self, name: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, SessionCall::Kill { name: n } if n == name))
            .count()
    }

    fn require(&self, name: &str) -> Result<(), SessionError> {
        if self.inner.lock().sessions.contains_key(name) {
            Ok(())
        } else {
            Err(SessionError::NotFound(name.to_string()))
        }
    }
}

#[async_trait]
impl SessionAdapter for FakeSessionAdapter {
    async fn is_available(&self) -> bool {
        self.inner.lock().available
    }

    async fn has_session(&self, name: &str) -> Result<bool, SessionError> {
        Ok(self.inner.lock().sessions.contains_key(name))
    }

    async fn is_program_running(&self, name: &str, _pattern: &str) -> Result<bool, SessionError> {
        Ok(self
            .inner
            .lock()
            .sessions
            .get(name)
            .map(|s| s.program_running)
            .unwrap_or(false))
    }

    async fn create(&self, name: &str, cwd: &Path) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::Create {
            name: name.to_string(),
            cwd: cwd.to_path_buf(),
        });

        if let Some(ref message) = inner.fail_create {
            return Err(SessionError::CreateFailed(message.clone()));
        }
        if inner.sessions.contains_key(name) {
            return Err(SessionError::AlreadyExists(name.to_string()));
        }

        let program_running = inner.programs_start;
        inner.sessions.insert(
            name.to_string(),
            FakeSession {
                cwd: cwd.to_path_buf(),
                env: Vec::new(),
                program_running,
                style: None,
            },
        );
        Ok(())
    }

    async fn kill(&self, name: &str) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::Kill {
            name: name.to_string(),
        });
        inner.sessions.remove(name);
        Ok(())
    }

    async fn set_environment(
        &self,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::SetEnvironment {
            name: name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        });
        let session = inner
            .sessions
            .get_mut(name)
            .ok_or_else(|| SessionError::NotFound(name.to_string()))?;
        session.env.push((key.to_string(), value.to_string()));
        Ok(())
    }

    async fn send_key(&self, name: &str, key: &str) -> Result<(), SessionError> {
        self.inner.lock().calls.push(SessionCall::SendKey {
            name: name.to_string(),
            key: key.to_string(),
        });
        self.require(name)
    }

    async fn send_literal(&self, name: &str, text: &str) -> Result<(), SessionError> {
        self.inner.lock().calls.push(SessionCall::SendLiteral {
            name: name.to_string(),
            text: text.to_string(),
            at: Instant::now(),
        });
        self.require(name)
    }

    async fn send_enter(&self, name: &str) -> Result<(), SessionError> {
        self.inner.lock().calls.push(SessionCall::SendEnter {
            name: name.to_string(),
        });
        self.require(name)
    }

    async fn configure(&self, name: &str, style: &SessionStyle) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::Configure {
            name: name.to_string(),
            style: style.clone(),
        });
        if let Some(session) = inner.sessions.get_mut(name) {
            session.style = Some(style.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
