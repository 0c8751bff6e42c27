// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Role configuration and resolution.
//!
//! Maps an [`AgentIdentity`] to everything needed to (re)create its session:
//! session name, working directory, start command, environment, and whether
//! the working tree must be synced first. Explicit records from `roles.toml`
//! are consulted under the current role key, then the legacy key; any field
//! they leave unset falls back to the built-in defaults.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

use crate::identity::{is_valid_agent_name, AgentIdentity, RoleType};

/// Matches `{placeholder}` in role templates. Lowercase only, so shell
/// expansions like `${HOME}` pass through untouched.
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([a-z_][a-z0-9_]*)\}").expect("constant regex pattern is valid")
});

/// Matches `${VAR:-default}` environment expansion in start commands
#[allow(clippy::expect_used)]
static ENV_DEFAULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(\w+):-([^}]*)\}").expect("constant regex pattern is valid")
});

const DEFAULT_START_COMMAND: &str = "exec ${WARDEN_AGENT_CMD:-claude} --dangerously-skip-permissions";
const DEFAULT_PROGRAM: &str = "claude";
const DEFAULT_PROPULSION: &str = "warden prime";

const PROJECT_PALETTE: [&str; 8] = [
    "colour24", "colour30", "colour60", "colour66", "colour94", "colour96", "colour130",
    "colour132",
];

/// Errors from role configuration
#[derive(Debug, Error)]
pub enum RoleError {
    #[error("failed to read role config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid role config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown placeholder {{{placeholder}}} in {template:?}")]
    UnknownPlaceholder {
        template: String,
        placeholder: String,
    },
    #[error("{0} resolved to an empty session name")]
    EmptySessionName(String),
    #[error("{0} has no usable agent name")]
    InvalidAgentName(String),
}

/// One role's explicit configuration. Unset fields use the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleConfig {
    /// Session name pattern
    #[serde(default)]
    pub session: Option<String>,
    /// Working directory pattern
    #[serde(default)]
    pub work_dir: Option<String>,
    #[serde(default)]
    pub start_command: Option<String>,
    /// Extra environment, values may use placeholders
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub needs_pre_sync: Option<bool>,
    /// Process name that proves the agent program is running
    #[serde(default)]
    pub program: Option<String>,
    /// Nudge that tells a freshly started agent to pick up its work
    #[serde(default)]
    pub propulsion: Option<String>,
    /// Status bar colour
    #[serde(default)]
    pub theme: Option<String>,
}

/// Contents of `roles.toml`:
///
/// ```toml
/// [roles.merger]
/// work_dir = "{root}/{project}/merger/rig"
/// needs_pre_sync = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RolesFile {
    #[serde(default)]
    pub roles: HashMap<String, RoleConfig>,
}

impl RolesFile {
    pub fn parse(content: &str) -> Result<Self, RoleError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from disk. A missing file means "defaults only".
    pub fn load(path: &Path) -> Result<Self, RoleError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(RoleError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Everything needed to create one agent's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRole {
    pub identity: AgentIdentity,
    pub session_name: String,
    pub work_dir: PathBuf,
    pub start_command: String,
    pub env: Vec<(String, String)>,
    pub needs_pre_sync: bool,
    pub program: String,
    pub propulsion: String,
    pub theme: Option<String>,
}

/// Resolves identities against role configuration.
#[derive(Debug, Clone)]
pub struct RoleResolver {
    root: PathBuf,
    roles: HashMap<String, RoleConfig>,
}

impl RoleResolver {
    pub fn new(root: impl Into<PathBuf>, file: RolesFile) -> Self {
        Self {
            root: root.into(),
            roles: file.roles,
        }
    }

    /// Resolver with no explicit records.
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        Self::new(root, RolesFile::default())
    }

    /// Deployment root substituted for `{root}`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Explicit record for a role, current key first, then legacy key.
    pub fn explicit(&self, role: RoleType) -> Option<&RoleConfig> {
        self.roles
            .get(role.key())
            .or_else(|| self.roles.get(role.legacy_key()))
    }

    pub fn resolve(&self, identity: &AgentIdentity) -> Result<ResolvedRole, RoleError> {
        // A worker named `monitor` would share the project monitor's session
        if identity.role.is_named() && !is_valid_agent_name(&identity.name) {
            return Err(RoleError::InvalidAgentName(identity.to_string()));
        }
        let defaults = default_config(identity.role);
        let explicit = self.explicit(identity.role);
        let pick = |f: fn(&RoleConfig) -> &Option<String>| -> String {
            explicit
                .and_then(|c| f(c).clone())
                .or_else(|| f(&defaults).clone())
                .unwrap_or_default()
        };

        let vars = self.vars(identity);
        let session_name = substitute(&pick(|c| &c.session), &vars)?;
        if session_name.trim().is_empty() {
            return Err(RoleError::EmptySessionName(identity.to_string()));
        }
        let work_dir = PathBuf::from(substitute(&pick(|c| &c.work_dir), &vars)?);
        let start_command = expand_env_defaults(&substitute(&pick(|c| &c.start_command), &vars)?);

        let mut env: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in defaults
            .env
            .iter()
            .chain(explicit.map(|c| c.env.iter()).into_iter().flatten())
        {
            env.insert(key.clone(), substitute(value, &vars)?);
        }
        if identity.project.is_empty() {
            env.remove("WARDEN_PROJECT");
        }

        let theme = explicit
            .and_then(|c| c.theme.clone())
            .or_else(|| default_theme(identity));

        Ok(ResolvedRole {
            identity: identity.clone(),
            session_name,
            work_dir,
            start_command,
            env: env.into_iter().collect(),
            needs_pre_sync: explicit
                .and_then(|c| c.needs_pre_sync)
                .or(defaults.needs_pre_sync)
                .unwrap_or(false),
            program: pick(|c| &c.program),
            propulsion: substitute(&pick(|c| &c.propulsion), &vars)?,
            theme,
        })
    }

    fn vars(&self, identity: &AgentIdentity) -> HashMap<&'static str, String> {
        HashMap::from([
            ("root", self.root.display().to_string()),
            ("project", identity.project.clone()),
            ("name", identity.name.clone()),
            ("role", identity.role.key().to_string()),
            ("identity", identity.flat()),
            ("address", identity.address()),
        ])
    }
}

/// Built-in configuration for each role type.
pub fn default_config(role: RoleType) -> RoleConfig {
    let (session, work_dir, needs_pre_sync) = match role {
        RoleType::Coordinator => ("wd-coordinator", "{root}", false),
        RoleType::Relay => ("wd-relay", "{root}/relay", false),
        RoleType::Triage => ("wd-triage", "{root}/relay/triage", false),
        RoleType::Monitor => ("wd-{project}-monitor", "{root}/{project}", false),
        RoleType::Merger => ("wd-{project}-merger", "{root}/{project}/merger/rig", true),
        RoleType::Crew => ("wd-{project}-crew-{name}", "{root}/{project}/crew/{name}", true),
        RoleType::Worker => ("wd-{project}-{name}", "{root}/{project}/workers/{name}", false),
    };
    RoleConfig {
        session: Some(session.to_string()),
        work_dir: Some(work_dir.to_string()),
        start_command: Some(DEFAULT_START_COMMAND.to_string()),
        env: BTreeMap::from([
            ("WARDEN_ROLE".to_string(), "{role}".to_string()),
            ("WARDEN_PROJECT".to_string(), "{project}".to_string()),
            ("WARDEN_AGENT".to_string(), "{identity}".to_string()),
            ("BD_ACTOR".to_string(), "{address}".to_string()),
        ]),
        needs_pre_sync: Some(needs_pre_sync),
        program: Some(DEFAULT_PROGRAM.to_string()),
        propulsion: Some(DEFAULT_PROPULSION.to_string()),
        theme: None,
    }
}

fn default_theme(identity: &AgentIdentity) -> Option<String> {
    let colour = match identity.role {
        RoleType::Coordinator => "colour136",
        RoleType::Relay | RoleType::Triage => "colour239",
        _ => {
            let sum: usize = identity.project.bytes().map(usize::from).sum();
            PROJECT_PALETTE[sum % PROJECT_PALETTE.len()]
        }
    };
    Some(colour.to_string())
}

/// Replace `{placeholder}`s, failing on any name not in `vars`.
pub fn substitute(template: &str, vars: &HashMap<&'static str, String>) -> Result<String, RoleError> {
    if let Some(caps) = PLACEHOLDER
        .captures_iter(template)
        .find(|caps| !vars.contains_key(&caps[1]))
    {
        return Err(RoleError::UnknownPlaceholder {
            template: template.to_string(),
            placeholder: caps[1].to_string(),
        });
    }
    Ok(PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| {
            vars.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned())
}

fn expand_env_defaults(command: &str) -> String {
    ENV_DEFAULT
        .replace_all(command, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[2].to_string())
        })
        .into_owned()
}

#[cfg(test)]
#[path = "role_tests.rs"]
mod tests;
