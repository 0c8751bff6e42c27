// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session management adapters

mod tmux;

pub use tmux::TmuxAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSession, FakeSessionAdapter, SessionCall};

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Pause between the Escape presses that clear an agent's input line.
pub const NUDGE_KEY_PAUSE: Duration = Duration::from_millis(50);

/// Errors from session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("session already exists: {0}")]
    AlreadyExists(String),
    #[error("working directory does not exist: {0}")]
    MissingWorkDir(String),
    #[error("create failed: {0}")]
    CreateFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// Status bar styling applied to agent sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStyle {
    /// Status bar background colour
    pub colour: Option<String>,
    /// Terminal title
    pub title: Option<String>,
    /// Left side of the status bar
    pub status_left: Option<String>,
}

/// Adapter for managing terminal sessions (tmux, etc.)
///
/// Sessions are addressed by name. Whether a session exists and whether the
/// agent program is running inside it are separate questions; callers must
/// ask both.
#[async_trait]
pub trait SessionAdapter: Clone + Send + Sync + 'static {
    /// Whether the session manager itself can be reached
    async fn is_available(&self) -> bool;

    /// Check if a session exists
    async fn has_session(&self, name: &str) -> Result<bool, SessionError>;

    /// Check if a process matching pattern is running inside the session
    async fn is_program_running(&self, name: &str, pattern: &str) -> Result<bool, SessionError>;

    /// Create a detached session with a shell in `cwd`
    async fn create(&self, name: &str, cwd: &Path) -> Result<(), SessionError>;

    /// Kill a session. Killing a missing session is not an error.
    async fn kill(&self, name: &str) -> Result<(), SessionError>;

    /// Set an environment variable on the session
    async fn set_environment(&self, name: &str, key: &str, value: &str)
        -> Result<(), SessionError>;

    /// Send a key by name (`Escape`, `C-c`, ...)
    async fn send_key(&self, name: &str, key: &str) -> Result<(), SessionError>;

    /// Send literal text (no key interpretation)
    async fn send_literal(&self, name: &str, text: &str) -> Result<(), SessionError>;

    /// Send the Enter key
    async fn send_enter(&self, name: &str) -> Result<(), SessionError>;

    /// Apply status bar styling. Default implementation is a no-op.
    async fn configure(&self, _name: &str, _style: &SessionStyle) -> Result<(), SessionError> {
        Ok(())
    }

    /// Type a command line into the session's shell and run it.
    async fn send_keys(&self, name: &str, text: &str) -> Result<(), SessionError> {
        self.send_literal(name, text).await?;
        self.send_enter(name).await
    }

    /// [`SessionAdapter::send_keys`] after waiting `delay`.
    async fn send_keys_delayed(
        &self,
        name: &str,
        text: &str,
        delay: Duration,
    ) -> Result<(), SessionError> {
        tokio::time::sleep(delay).await;
        self.send_keys(name, text).await
    }

    /// Deliver a message to a running agent's prompt.
    ///
    /// Clears any half-typed input first, then gives the TUI time to render
    /// the pasted text before submitting it.
    async fn nudge(&self, name: &str, text: &str) -> Result<(), SessionError> {
        for _ in 0..2 {
            self.send_key(name, "Escape").await?;
            tokio::time::sleep(NUDGE_KEY_PAUSE).await;
        }
        self.send_literal(name, text).await?;
        // Scale delay with input length: TUI re-renders per keystroke
        let text_settle = Duration::from_millis((100 + text.len() as u64).min(2000));
        tokio::time::sleep(text_settle).await;
        self.send_enter(name).await
    }

    /// Make sure a session named `name` can be created fresh.
    ///
    /// A session whose agent program is gone (a zombie) is killed and
    /// recreated. A session whose program is running is left alone and
    /// reported as [`SessionError::AlreadyExists`].
    async fn ensure_fresh(
        &self,
        name: &str,
        cwd: &Path,
        pattern: &str,
    ) -> Result<(), SessionError> {
        if self.has_session(name).await? {
            if self.is_program_running(name, pattern).await? {
                return Err(SessionError::AlreadyExists(name.to_string()));
            }
            tracing::warn!(session = name, "killing zombie session");
            self.kill(name).await?;
        }
        self.create(name, cwd).await
    }
}
