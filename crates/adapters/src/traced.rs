// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::session::{SessionAdapter, SessionError, SessionStyle};
use async_trait::async_trait;
use std::path::Path;
use tracing::Instrument;

/// Wrapper that adds tracing to any SessionAdapter
#[derive(Clone)]
pub struct TracedSession<S> {
    inner: S,
}

impl<S> TracedSession<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: SessionAdapter> SessionAdapter for TracedSession<S> {
    async fn is_available(&self) -> bool {
        let available = self.inner.is_available().await;
        tracing::trace!(available, "session manager checked");
        available
    }

    async fn has_session(&self, name: &str) -> Result<bool, SessionError> {
        let result = self.inner.has_session(name).await;
        tracing::trace!(name, exists = ?result.as_ref().ok(), "checked");
        result
    }

    async fn is_program_running(&self, name: &str, pattern: &str) -> Result<bool, SessionError> {
        let result = self.inner.is_program_running(name, pattern).await;
        tracing::trace!(name, pattern, running = ?result.as_ref().ok(), "checked");
        result
    }

    async fn create(&self, name: &str, cwd: &Path) -> Result<(), SessionError> {
        async {
            tracing::info!("starting");
            let start = std::time::Instant::now();
            let result = self.inner.create(name, cwd).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "session created"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "create failed"),
            }
            result
        }
        .instrument(tracing::info_span!("session.create", name, cwd = %cwd.display()))
        .await
    }

    async fn kill(&self, name: &str) -> Result<(), SessionError> {
        let result = self.inner.kill(name).await;
        tracing::info_span!("session.kill", name).in_scope(|| match &result {
            Ok(()) => tracing::info!("killed"),
            Err(e) => tracing::warn!(error = %e, "kill failed (may be expected)"),
        });
        result
    }

    async fn set_environment(
        &self,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        let result = self.inner.set_environment(name, key, value).await;
        if let Err(ref e) = result {
            tracing::error!(name, key, error = %e, "set_environment failed");
        }
        result
    }

    async fn send_key(&self, name: &str, key: &str) -> Result<(), SessionError> {
        let result = self.inner.send_key(name, key).await;
        if let Err(ref e) = result {
            tracing::error!(name, key, error = %e, "send_key failed");
        }
        result
    }

    async fn send_literal(&self, name: &str, text: &str) -> Result<(), SessionError> {
        let result = self.inner.send_literal(name, text).await;
        if let Err(ref e) = result {
            tracing::error!(name, error = %e, "send_literal failed");
        }
        result
    }

    async fn send_enter(&self, name: &str) -> Result<(), SessionError> {
        let result = self.inner.send_enter(name).await;
        if let Err(ref e) = result {
            tracing::error!(name, error = %e, "send_enter failed");
        }
        result
    }

    async fn configure(&self, name: &str, style: &SessionStyle) -> Result<(), SessionError> {
        self.inner.configure(name, style).await
    }

    async fn nudge(&self, name: &str, text: &str) -> Result<(), SessionError> {
        async {
            tracing::debug!(text_len = text.len(), "sending");
            let result = self.inner.nudge(name, text).await;
            match &result {
                Ok(()) => tracing::info!("nudged"),
                Err(e) => tracing::error!(error = %e, "nudge failed"),
            }
            result
        }
        .instrument(tracing::info_span!("session.nudge", name))
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
