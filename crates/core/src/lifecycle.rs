// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle requests sent by agents asking to be cycled, restarted, or
//! shut down.
//!
//! Wire format: subject starting with `LIFECYCLE:` (any case) and a JSON body
//! `{"action": "cycle" | "restart" | "shutdown", "from": "<identity>"}`.
//! Older agents send a plain-text subject instead:
//! `LIFECYCLE: <identity> requesting <action>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::identity::{AgentIdentity, IdentityError};
use crate::message::Message;

/// Subject prefix that marks a message as a lifecycle request.
pub const LIFECYCLE_MARKER: &str = "LIFECYCLE:";

/// Requests older than this are discarded without execution.
pub const MAX_REQUEST_AGE: Duration = Duration::from_secs(6 * 60 * 60);

/// What an agent wants done to its own session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    /// Hand off context and come back in a fresh session
    Cycle,
    Restart,
    Shutdown,
}

impl LifecycleAction {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "cycle" | "cycling" => Some(LifecycleAction::Cycle),
            "restart" | "restarting" => Some(LifecycleAction::Restart),
            "shutdown" | "stop" | "stopping" => Some(LifecycleAction::Shutdown),
            _ => None,
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleAction::Cycle => write!(f, "cycle"),
            LifecycleAction::Restart => write!(f, "restart"),
            LifecycleAction::Shutdown => write!(f, "shutdown"),
        }
    }
}

impl FromStr for LifecycleAction {
    type Err = RequestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_word(&s.trim().to_ascii_lowercase())
            .ok_or_else(|| RequestParseError::UnknownAction(s.to_string()))
    }
}

/// Errors from lifecycle request parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestParseError {
    #[error("not a lifecycle request")]
    NotLifecycle,
    #[error("lifecycle request names no action")]
    MissingAction,
    #[error("unknown lifecycle action: {0}")]
    UnknownAction(String),
    #[error("lifecycle request has no sender")]
    MissingSender,
    #[error("invalid lifecycle sender: {0}")]
    InvalidSender(#[from] IdentityError),
}

#[derive(Deserialize)]
struct RequestBody {
    action: String,
    #[serde(default)]
    from: Option<String>,
}

/// A parsed lifecycle request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleRequest {
    pub from: AgentIdentity,
    pub action: LifecycleAction,
    pub timestamp: DateTime<Utc>,
}

impl LifecycleRequest {
    /// Whether a message carries the lifecycle marker at all.
    pub fn is_lifecycle_message(msg: &Message) -> bool {
        strip_marker(&msg.subject).is_some()
    }

    /// Parse a lifecycle request from a mail message.
    ///
    /// The sender comes from the JSON `from` field, then the subject's
    /// `<identity> requesting` clause, then the message sender. `now` stands
    /// in for the timestamp when the backend did not supply one.
    pub fn from_message(msg: &Message, now: DateTime<Utc>) -> Result<Self, RequestParseError> {
        let rest = strip_marker(&msg.subject).ok_or(RequestParseError::NotLifecycle)?;
        let subject_from = subject_sender(rest);

        let (action, body_from) = match serde_json::from_str::<RequestBody>(msg.body.trim()) {
            Ok(body) => (body.action.parse::<LifecycleAction>()?, body.from),
            Err(_) => (subject_action(rest)?, None),
        };

        let from = body_from
            .filter(|s| !s.trim().is_empty())
            .or(subject_from)
            .or_else(|| Some(msg.sender.clone()).filter(|s| !s.trim().is_empty()))
            .ok_or(RequestParseError::MissingSender)?;

        Ok(Self {
            from: AgentIdentity::parse(&from)?,
            action,
            timestamp: msg.created_at.unwrap_or(now),
        })
    }

    /// Whether the request is too old to act on.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.timestamp);
        age.to_std().map(|age| age > MAX_REQUEST_AGE).unwrap_or(false)
    }

    /// Subject line for a request, as agents send it.
    pub fn subject(from: &AgentIdentity, action: LifecycleAction) -> String {
        format!("{} {} requesting {}", LIFECYCLE_MARKER, from, action)
    }

    /// JSON body for a request, as agents send it.
    pub fn body(from: &AgentIdentity, action: LifecycleAction) -> String {
        serde_json::json!({ "action": action, "from": from }).to_string()
    }
}

fn strip_marker(subject: &str) -> Option<&str> {
    let trimmed = subject.trim_start();
    let head = trimmed.get(..LIFECYCLE_MARKER.len())?;
    if head.eq_ignore_ascii_case(LIFECYCLE_MARKER) {
        Some(&trimmed[LIFECYCLE_MARKER.len()..])
    } else {
        None
    }
}

fn subject_sender(rest: &str) -> Option<String> {
    let lowered = rest.to_ascii_lowercase();
    let pos = lowered.find(" requesting")?;
    let who = rest[..pos].trim();
    if who.is_empty() {
        None
    } else {
        Some(who.to_string())
    }
}

fn subject_action(rest: &str) -> Result<LifecycleAction, RequestParseError> {
    let lowered = rest.to_ascii_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    // The sender precedes "requesting"; only look at what follows when present.
    let candidates = match words.iter().position(|w| *w == "requesting") {
        Some(pos) => &words[pos + 1..],
        None => &words[..],
    };
    candidates
        .iter()
        .find_map(|w| LifecycleAction::from_word(w))
        .ok_or(RequestParseError::MissingAction)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
