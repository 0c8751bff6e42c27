// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the daemon crate.

use crate::config::Config;
use crate::supervisor::{Supervisor, SupervisorConfig, SupervisorDeps};
use std::path::PathBuf;
use tempfile::TempDir;
use warden_adapters::{FakeLedger, FakeMailbox, FakeSessionAdapter, FakeWorkspaceSync};
use warden_core::{load_registry, AgentIdentity, Clock, FakeClock, ResolvedRole, RoleResolver};

/// Convenience alias for the fully-typed test supervisor.
pub(crate) type TestSupervisor =
    Supervisor<FakeSessionAdapter, FakeLedger, FakeMailbox, FakeWorkspaceSync, FakeClock>;

/// Test context holding the supervisor, its fakes, and a scratch root.
pub(crate) struct TestContext {
    pub supervisor: TestSupervisor,
    pub clock: FakeClock,
    pub config: Config,
    pub sessions: FakeSessionAdapter,
    pub ledger: FakeLedger,
    pub mail: FakeMailbox,
    pub sync: FakeWorkspaceSync,
    _dir: TempDir,
}

/// Create a supervisor over fakes with an empty deployment root.
///
/// The relay and triage directories exist; projects are added with
/// [`TestContext::add_project`].
pub(crate) fn setup() -> TestContext {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    std::fs::create_dir_all(root.join("relay/triage")).unwrap();

    let config = Config::for_dirs(&root, root.join("daemon"));
    let sessions = FakeSessionAdapter::new();
    let ledger = FakeLedger::new();
    let mail = FakeMailbox::new();
    let sync = FakeWorkspaceSync::new();
    let clock = FakeClock::new();

    let supervisor = Supervisor::new(
        SupervisorDeps {
            sessions: sessions.clone(),
            ledger: ledger.clone(),
            mail: mail.clone(),
            sync: sync.clone(),
            roles: RoleResolver::with_defaults(&root),
        },
        clock.clone(),
        SupervisorConfig::from_config(&config, false),
    );

    TestContext {
        supervisor,
        clock,
        config,
        sessions,
        ledger,
        mail,
        sync,
        _dir: dir,
    }
}

impl TestContext {
    pub fn root(&self) -> PathBuf {
        self.config.root.clone()
    }

    /// Register a project and create its monitor and merger directories
    pub fn add_project(&self, project: &str) {
        let root = self.root();
        let mut projects = load_registry(&root).unwrap();
        projects.push(project.to_string());
        let entries: serde_json::Map<String, serde_json::Value> = projects
            .into_iter()
            .map(|p| (p, serde_json::json!({})))
            .collect();
        std::fs::write(
            root.join("projects.json"),
            serde_json::json!({ "projects": entries }).to_string(),
        )
        .unwrap();
        std::fs::create_dir_all(root.join(project).join("merger/rig")).unwrap();
    }

    /// Write `<root>/<project>/project.toml`
    pub fn set_project_settings(&self, project: &str, toml: &str) {
        let dir = self.root().join(project);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("project.toml"), toml).unwrap();
    }

    /// Create a worker's working tree
    pub fn add_worker_dir(&self, project: &str, name: &str) {
        std::fs::create_dir_all(self.root().join(project).join("workers").join(name)).unwrap();
    }

    pub fn role(&self, identity: &AgentIdentity) -> ResolvedRole {
        self.supervisor.roles.resolve(identity).unwrap()
    }

    pub fn session(&self, identity: &AgentIdentity) -> String {
        self.role(identity).session_name
    }

    /// Write the relay heartbeat file with the given age
    pub fn write_relay_heartbeat(&self, age: chrono::Duration) {
        let timestamp = self.clock.utc_now() - age;
        std::fs::write(
            &self.config.heartbeat_path,
            serde_json::json!({ "timestamp": timestamp, "cycle": 7, "last_action": "patrol" })
                .to_string(),
        )
        .unwrap();
    }
}
