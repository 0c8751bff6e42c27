// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messaging backend adapters

mod bd;

pub use bd::BdMailbox;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMailbox, SentMail};

use async_trait::async_trait;
use thiserror::Error;
use warden_core::Message;

/// Errors from messaging operations
#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail command failed: {0}")]
    CommandFailed(String),
    #[error("mail output unparseable: {0}")]
    Parse(String),
}

/// Addressed asynchronous messages between agents and the supervisor
#[async_trait]
pub trait Mailbox: Clone + Send + Sync + 'static {
    /// Messages currently addressed to `address`
    async fn inbox(&self, address: &str) -> Result<Vec<Message>, MailError>;

    /// Remove a message. This is how a message is claimed.
    async fn delete(&self, id: &str) -> Result<(), MailError>;

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}
