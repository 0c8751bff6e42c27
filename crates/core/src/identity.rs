// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identity parsing.
//!
//! Every string that names an agent (session names, ledger actors, mail
//! addresses, lifecycle senders) is turned into an [`AgentIdentity`] here and
//! nowhere else. Callers work with the structured form only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Prefix shared by ledger record ids and default session names.
pub const RECORD_PREFIX: &str = "wd-";

/// The kind of agent an identity refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    /// Global coordinator
    Coordinator,
    /// Heartbeat supervisor agent
    Relay,
    /// Disposable watchdog that triages the relay each tick
    Triage,
    /// Per-project health monitor
    Monitor,
    /// Per-project merge queue processor
    Merger,
    /// Long-lived per-project human-directed workspace
    Crew,
    /// Ephemeral per-project worker
    Worker,
}

impl RoleType {
    pub const ALL: [RoleType; 7] = [
        RoleType::Coordinator,
        RoleType::Relay,
        RoleType::Triage,
        RoleType::Monitor,
        RoleType::Merger,
        RoleType::Crew,
        RoleType::Worker,
    ];

    /// Current configuration key for this role.
    pub fn key(self) -> &'static str {
        match self {
            RoleType::Coordinator => "coordinator",
            RoleType::Relay => "relay",
            RoleType::Triage => "triage",
            RoleType::Monitor => "monitor",
            RoleType::Merger => "merger",
            RoleType::Crew => "crew",
            RoleType::Worker => "worker",
        }
    }

    /// Key used by older role configuration files and identities.
    pub fn legacy_key(self) -> &'static str {
        match self {
            RoleType::Coordinator => "mayor",
            RoleType::Relay => "deacon",
            RoleType::Triage => "boot",
            RoleType::Monitor => "witness",
            RoleType::Merger => "refinery",
            RoleType::Crew => "crew",
            RoleType::Worker => "polecat",
        }
    }

    /// Whether identities of this role live inside a project.
    pub fn is_project_scoped(self) -> bool {
        matches!(
            self,
            RoleType::Monitor | RoleType::Merger | RoleType::Crew | RoleType::Worker
        )
    }

    /// Whether identities of this role carry a per-agent name.
    pub fn is_named(self) -> bool {
        matches!(self, RoleType::Crew | RoleType::Worker)
    }

    fn from_global_keyword(s: &str) -> Option<Self> {
        match s {
            "coordinator" | "mayor" => Some(RoleType::Coordinator),
            "relay" | "deacon" => Some(RoleType::Relay),
            "triage" | "boot" => Some(RoleType::Triage),
            _ => None,
        }
    }

    fn from_project_keyword(s: &str) -> Option<Self> {
        match s {
            "monitor" | "witness" => Some(RoleType::Monitor),
            "merger" | "refinery" => Some(RoleType::Merger),
            _ => None,
        }
    }

    fn from_named_keyword(s: &str) -> Option<Self> {
        match s {
            "crew" => Some(RoleType::Crew),
            "worker" | "workers" | "polecat" | "polecats" => Some(RoleType::Worker),
            _ => None,
        }
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Errors from identity parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("empty agent identity")]
    Empty,
    #[error("unrecognized agent identity: {0}")]
    Unrecognized(String),
    #[error("agent identity {0} is missing a project")]
    MissingProject(String),
    #[error("agent identity {0} is missing a name")]
    MissingName(String),
    #[error("agent name {0:?} contains a role word")]
    ReservedName(String),
}

/// Role words that may not appear as a hyphen-separated segment of a crew or
/// worker name. They mark role boundaries in the flat form.
pub const RESERVED_NAME_SEGMENTS: [&str; 7] = [
    "crew", "worker", "polecat", "monitor", "witness", "merger", "refinery",
];

/// Whether `name` can be used as a crew or worker name.
pub fn is_valid_agent_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('-').all(|segment| {
            !RESERVED_NAME_SEGMENTS
                .iter()
                .any(|reserved| segment.eq_ignore_ascii_case(reserved))
        })
}

/// Structured reference to a single agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentIdentity {
    pub role: RoleType,
    /// Empty for global roles
    pub project: String,
    /// Empty for singleton roles
    pub name: String,
}

impl AgentIdentity {
    pub fn coordinator() -> Self {
        Self::global(RoleType::Coordinator)
    }

    pub fn relay() -> Self {
        Self::global(RoleType::Relay)
    }

    pub fn triage() -> Self {
        Self::global(RoleType::Triage)
    }

    pub fn monitor(project: impl Into<String>) -> Self {
        Self::project_singleton(RoleType::Monitor, project)
    }

    pub fn merger(project: impl Into<String>) -> Self {
        Self::project_singleton(RoleType::Merger, project)
    }

    pub fn crew(project: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: RoleType::Crew,
            project: project.into(),
            name: name.into(),
        }
    }

    pub fn worker(project: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: RoleType::Worker,
            project: project.into(),
            name: name.into(),
        }
    }

    fn global(role: RoleType) -> Self {
        Self {
            role,
            project: String::new(),
            name: String::new(),
        }
    }

    fn project_singleton(role: RoleType, project: impl Into<String>) -> Self {
        Self {
            role,
            project: project.into(),
            name: String::new(),
        }
    }

    /// Parse any accepted identity form.
    ///
    /// Flat forms: `coordinator`, `relay`, `triage`, `<p>-monitor`,
    /// `<p>-merger`, `<p>-crew-<n>`, `<p>-worker-<n>`.
    /// Address forms: `relay/`, `<p>/monitor`, `<p>/crew/<n>`,
    /// `<p>/workers/<n>`. Legacy role words (`mayor`, `deacon`, `boot`,
    /// `witness`, `refinery`, `polecat`) are accepted in both.
    ///
    /// Project names may contain role words; crew and worker names may not
    /// (see [`is_valid_agent_name`]), which keeps the flat form unambiguous.
    pub fn parse(input: &str) -> Result<Self, IdentityError> {
        let trimmed = input.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(IdentityError::Empty);
        }
        // ASCII lowercasing keeps byte offsets aligned with `trimmed`.
        let lowered = trimmed.to_ascii_lowercase();

        if let Some(role) = RoleType::from_global_keyword(&lowered) {
            return Ok(Self::global(role));
        }

        if lowered.contains('/') {
            parse_address(trimmed, &lowered)
        } else {
            parse_flat(trimmed, &lowered)
        }
    }

    /// Canonical flat form (`<p>-worker-<n>`, `relay`, ...).
    pub fn flat(&self) -> String {
        match (self.role.is_project_scoped(), self.role.is_named()) {
            (false, _) => self.role.key().to_string(),
            (true, false) => format!("{}-{}", self.project, self.role.key()),
            (true, true) => format!("{}-{}-{}", self.project, self.role.key(), self.name),
        }
    }

    /// Mail address (`relay/`, `<p>/monitor`, `<p>/workers/<n>`).
    pub fn address(&self) -> String {
        match self.role {
            RoleType::Coordinator | RoleType::Relay | RoleType::Triage => {
                format!("{}/", self.role.key())
            }
            RoleType::Monitor | RoleType::Merger => {
                format!("{}/{}", self.project, self.role.key())
            }
            RoleType::Crew => format!("{}/crew/{}", self.project, self.name),
            RoleType::Worker => format!("{}/workers/{}", self.project, self.name),
        }
    }

    /// Ledger record id (`wd-<flat>`).
    pub fn record_id(&self) -> String {
        format!("{}{}", RECORD_PREFIX, self.flat())
    }

    /// Invert [`AgentIdentity::record_id`].
    pub fn from_record_id(id: &str) -> Result<Self, IdentityError> {
        let flat = id
            .strip_prefix(RECORD_PREFIX)
            .ok_or_else(|| IdentityError::Unrecognized(id.to_string()))?;
        Self::parse(flat)
    }

    /// The project this agent belongs to, if any.
    pub fn project(&self) -> Option<&str> {
        if self.project.is_empty() {
            None
        } else {
            Some(&self.project)
        }
    }

    /// Address of the agent responsible for escalations about this one.
    ///
    /// Project-scoped agents report to their project's monitor, global agents
    /// report to the relay.
    pub fn monitor_address(&self) -> String {
        match self.project() {
            Some(project) => AgentIdentity::monitor(project).address(),
            None => AgentIdentity::relay().address(),
        }
    }
}

fn parse_address(original: &str, lowered: &str) -> Result<AgentIdentity, IdentityError> {
    let parts: Vec<&str> = lowered.split('/').collect();
    let original_parts: Vec<&str> = original.split('/').collect();
    match parts.as_slice() {
        [project, role] => {
            if project.is_empty() {
                return Err(IdentityError::MissingProject(original.to_string()));
            }
            let role = RoleType::from_project_keyword(role)
                .ok_or_else(|| IdentityError::Unrecognized(original.to_string()))?;
            Ok(AgentIdentity::project_singleton(role, original_parts[0]))
        }
        [project, role, name] => {
            let role = RoleType::from_named_keyword(role)
                .ok_or_else(|| IdentityError::Unrecognized(original.to_string()))?;
            if project.is_empty() {
                return Err(IdentityError::MissingProject(original.to_string()));
            }
            if name.is_empty() {
                return Err(IdentityError::MissingName(original.to_string()));
            }
            if !is_valid_agent_name(name) {
                return Err(IdentityError::ReservedName(original_parts[2].to_string()));
            }
            Ok(AgentIdentity {
                role,
                project: original_parts[0].to_string(),
                name: original_parts[2].to_string(),
            })
        }
        _ => Err(IdentityError::Unrecognized(original.to_string())),
    }
}

fn parse_flat(original: &str, lowered: &str) -> Result<AgentIdentity, IdentityError> {
    // The rightmost named marker splits project from name. A name holding a
    // role word means the marker belongs to the project instead.
    let named = ["crew", "worker", "polecat"]
        .into_iter()
        .filter_map(|keyword| {
            let marker = format!("-{}-", keyword);
            lowered
                .rfind(&marker)
                .map(|pos| (pos, pos + marker.len(), keyword))
        })
        .max_by_key(|(pos, _, _)| *pos);

    if let Some((pos, name_start, keyword)) = named {
        let name = &original[name_start..];
        if is_valid_agent_name(name) {
            if pos == 0 {
                return Err(IdentityError::MissingProject(original.to_string()));
            }
            let role = RoleType::from_named_keyword(keyword)
                .ok_or_else(|| IdentityError::Unrecognized(original.to_string()))?;
            return Ok(AgentIdentity {
                role,
                project: original[..pos].to_string(),
                name: name.to_string(),
            });
        }
        if name.is_empty() {
            return Err(IdentityError::MissingName(original.to_string()));
        }
    }

    for keyword in ["monitor", "witness", "merger", "refinery"] {
        let Some(project) = lowered
            .strip_suffix(keyword)
            .and_then(|rest| rest.strip_suffix('-'))
        else {
            continue;
        };
        if project.is_empty() {
            return Err(IdentityError::MissingProject(original.to_string()));
        }
        let role = RoleType::from_project_keyword(keyword)
            .ok_or_else(|| IdentityError::Unrecognized(original.to_string()))?;
        return Ok(AgentIdentity::project_singleton(
            role,
            &original[..project.len()],
        ));
    }

    match named {
        Some((_, name_start, _)) => Err(IdentityError::ReservedName(
            original[name_start..].to_string(),
        )),
        None => Err(IdentityError::Unrecognized(original.to_string())),
    }
}

impl fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.flat())
    }
}

impl FromStr for AgentIdentity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AgentIdentity {
    type Error = IdentityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<AgentIdentity> for String {
    fn from(id: AgentIdentity) -> Self {
        id.flat()
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
