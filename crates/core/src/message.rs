// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mail messages as returned by the messaging backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single inbox message.
///
/// Field aliases accept the ledger's issue-shaped JSON (`title`,
/// `description`) as well as mail-shaped JSON (`subject`, `body`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(alias = "title", default)]
    pub subject: String,
    #[serde(alias = "description", default)]
    pub body: String,
    #[serde(alias = "from", default)]
    pub sender: String,
    #[serde(default)]
    pub status: String,
    #[serde(alias = "timestamp", default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            body: String::new(),
            sender: String::new(),
            status: "open".to_string(),
            created_at: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    pub fn sent_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Already-handled messages are kept around by some backends.
    pub fn is_closed(&self) -> bool {
        self.status.eq_ignore_ascii_case("closed")
    }
}
