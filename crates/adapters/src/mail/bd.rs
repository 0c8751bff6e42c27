// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox backed by `bd mail`

use super::{MailError, Mailbox};
use async_trait::async_trait;
use std::path::PathBuf;
use warden_core::Message;

/// Identity the supervisor sends mail as.
const SENDER: &str = "warden/";

#[derive(Clone)]
pub struct BdMailbox {
    root: PathBuf,
}

impl BdMailbox {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

pub(crate) fn parse_inbox(stdout: &[u8]) -> Result<Vec<Message>, MailError> {
    let text = String::from_utf8_lossy(stdout);
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&text).map_err(|e| MailError::Parse(e.to_string()))
}

#[async_trait]
impl Mailbox for BdMailbox {
    async fn inbox(&self, address: &str) -> Result<Vec<Message>, MailError> {
        let stdout = crate::bd::run(
            &self.root,
            &["mail", "inbox", "--identity", address, "--json"],
        )
        .await
        .map_err(MailError::CommandFailed)?;
        match stdout {
            Some(stdout) => parse_inbox(&stdout),
            None => Ok(Vec::new()),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), MailError> {
        match crate::bd::run(&self.root, &["mail", "delete", id])
            .await
            .map_err(MailError::CommandFailed)?
        {
            Some(_) => Ok(()),
            None => Err(MailError::CommandFailed(format!("message {} not found", id))),
        }
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        crate::bd::run(
            &self.root,
            &[
                "mail",
                "send",
                to,
                "--identity",
                SENDER,
                "-s",
                subject,
                "-m",
                body,
            ],
        )
        .await
        .map_err(MailError::CommandFailed)?
        .map(|_| ())
        .ok_or_else(|| MailError::CommandFailed(format!("recipient {} not found", to)))
    }
}

#[cfg(test)]
#[path = "bd_tests.rs"]
mod tests;
