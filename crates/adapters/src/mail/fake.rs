// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake mailbox for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{MailError, Mailbox};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use warden_core::Message;

/// A message the code under test sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
struct FakeMailboxState {
    inboxes: HashMap<String, Vec<Message>>,
    sent: Vec<SentMail>,
    deleted: Vec<String>,
    fail_delete: bool,
    fail_send: bool,
}

/// In-memory mailbox
#[derive(Clone, Default)]
pub struct FakeMailbox {
    inner: Arc<Mutex<FakeMailboxState>>,
}

impl FakeMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a message to `address`
    pub fn deliver(&self, address: &str, message: Message) {
        self.inner
            .lock()
            .inboxes
            .entry(address.to_string())
            .or_default()
            .push(message);
    }

    pub fn pending(&self, address: &str) -> Vec<Message> {
        self.inner
            .lock()
            .inboxes
            .get(address)
            .cloned()
            .unwrap_or_default()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.inner.lock().sent.clone()
    }

    /// Messages sent to one address
    pub fn sent_to(&self, to: &str) -> Vec<SentMail> {
        self.sent().into_iter().filter(|m| m.to == to).collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.inner.lock().deleted.clone()
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.inner.lock().fail_delete = fail;
    }

    pub fn set_fail_send(&self, fail: bool) {
        self.inner.lock().fail_send = fail;
    }
}

#[async_trait]
impl Mailbox for FakeMailbox {
    async fn inbox(&self, address: &str) -> Result<Vec<Message>, MailError> {
        Ok(self.pending(address))
    }

    async fn delete(&self, id: &str) -> Result<(), MailError> {
        let mut inner = self.inner.lock();
        if inner.fail_delete {
            return Err(MailError::CommandFailed("delete refused".to_string()));
        }
        let mut found = false;
        for messages in inner.inboxes.values_mut() {
            let before = messages.len();
            messages.retain(|m| m.id != id);
            found |= messages.len() != before;
        }
        if !found {
            return Err(MailError::CommandFailed(format!("message {} not found", id)));
        }
        inner.deleted.push(id.to_string());
        Ok(())
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let mut inner = self.inner.lock();
        if inner.fail_send {
            return Err(MailError::CommandFailed("send refused".to_string()));
        }
        inner.sent.push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
