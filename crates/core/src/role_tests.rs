// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn env_of(role: &ResolvedRole, key: &str) -> Option<String> {
    role.env
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

#[yare::parameterized(
    coordinator = { AgentIdentity::coordinator(),            "wd-coordinator",        "/town",                         false },
    relay       = { AgentIdentity::relay(),                  "wd-relay",              "/town/relay",                   false },
    monitor     = { AgentIdentity::monitor("gastown"),       "wd-gastown-monitor",    "/town/gastown",                 false },
    merger      = { AgentIdentity::merger("gastown"),        "wd-gastown-merger",     "/town/gastown/merger/rig",      true },
    crew        = { AgentIdentity::crew("gastown", "max"),   "wd-gastown-crew-max",   "/town/gastown/crew/max",        true },
    worker      = { AgentIdentity::worker("gastown", "nux"), "wd-gastown-nux",        "/town/gastown/workers/nux",     false },
)]
fn default_table(id: AgentIdentity, session: &str, work_dir: &str, pre_sync: bool) {
    let resolved = RoleResolver::with_defaults("/town").resolve(&id).unwrap();
    assert_eq!(resolved.session_name, session);
    assert_eq!(resolved.work_dir, PathBuf::from(work_dir));
    assert_eq!(resolved.needs_pre_sync, pre_sync);
    assert_eq!(resolved.program, "claude");
    assert!(resolved.start_command.contains("--dangerously-skip-permissions"));
}

#[test]
fn default_env_names_the_agent() {
    let resolved = RoleResolver::with_defaults("/town")
        .resolve(&AgentIdentity::worker("gastown", "nux"))
        .unwrap();
    assert_eq!(env_of(&resolved, "WARDEN_ROLE").as_deref(), Some("worker"));
    assert_eq!(env_of(&resolved, "WARDEN_PROJECT").as_deref(), Some("gastown"));
    assert_eq!(
        env_of(&resolved, "WARDEN_AGENT").as_deref(),
        Some("gastown-worker-nux")
    );
    assert_eq!(
        env_of(&resolved, "BD_ACTOR").as_deref(),
        Some("gastown/workers/nux")
    );
}

#[test]
fn global_roles_have_no_project_env() {
    let resolved = RoleResolver::with_defaults("/town")
        .resolve(&AgentIdentity::relay())
        .unwrap();
    assert_eq!(env_of(&resolved, "WARDEN_PROJECT"), None);
}

#[test]
fn explicit_record_overrides_only_set_fields() {
    let file = RolesFile::parse(
        r#"
        [roles.monitor]
        work_dir = "{root}/{project}/monitor"
        propulsion = "patrol {project}"
        env = { EXTRA = "{address}" }
        "#,
    )
    .unwrap();
    let resolved = RoleResolver::new("/town", file)
        .resolve(&AgentIdentity::monitor("gastown"))
        .unwrap();
    assert_eq!(resolved.work_dir, PathBuf::from("/town/gastown/monitor"));
    assert_eq!(resolved.session_name, "wd-gastown-monitor");
    assert_eq!(resolved.propulsion, "patrol gastown");
    assert_eq!(env_of(&resolved, "EXTRA").as_deref(), Some("gastown/monitor"));
    assert_eq!(env_of(&resolved, "WARDEN_ROLE").as_deref(), Some("monitor"));
}

#[yare::parameterized(
    witness  = { "witness",  AgentIdentity::monitor("gastown") },
    refinery = { "refinery", AgentIdentity::merger("gastown") },
    polecat  = { "polecat",  AgentIdentity::worker("gastown", "nux") },
    deacon   = { "deacon",   AgentIdentity::relay() },
    mayor    = { "mayor",    AgentIdentity::coordinator() },
)]
fn legacy_key_is_consulted(key: &str, id: AgentIdentity) {
    let file = RolesFile::parse(&format!("[roles.{}]\nsession = \"legacy-{{role}}\"\n", key)).unwrap();
    let resolved = RoleResolver::new("/town", file).resolve(&id).unwrap();
    assert_eq!(resolved.session_name, format!("legacy-{}", id.role.key()));
}

#[test]
fn current_key_beats_legacy_key() {
    let file = RolesFile::parse(
        r#"
        [roles.witness]
        session = "old"
        [roles.monitor]
        session = "new"
        "#,
    )
    .unwrap();
    let resolved = RoleResolver::new("/town", file)
        .resolve(&AgentIdentity::monitor("gastown"))
        .unwrap();
    assert_eq!(resolved.session_name, "new");
}

#[test]
fn explicit_pre_sync_false_wins_over_default() {
    let file = RolesFile::parse("[roles.merger]\nneeds_pre_sync = false\n").unwrap();
    let resolved = RoleResolver::new("/town", file)
        .resolve(&AgentIdentity::merger("gastown"))
        .unwrap();
    assert!(!resolved.needs_pre_sync);
}

#[test]
fn unknown_placeholder_is_an_error() {
    let file = RolesFile::parse("[roles.worker]\nwork_dir = \"{root}/{rig}\"\n").unwrap();
    let err = RoleResolver::new("/town", file)
        .resolve(&AgentIdentity::worker("gastown", "nux"))
        .unwrap_err();
    assert!(
        matches!(err, RoleError::UnknownPlaceholder { ref placeholder, .. } if placeholder == "rig")
    );
}

#[test]
fn shell_expansions_pass_through() {
    let file = RolesFile::parse("[roles.worker]\nstart_command = \"cd ${HOME} && run {name}\"\n")
        .unwrap();
    let resolved = RoleResolver::new("/town", file)
        .resolve(&AgentIdentity::worker("gastown", "nux"))
        .unwrap();
    assert_eq!(resolved.start_command, "cd ${HOME} && run nux");
}

#[test]
fn empty_session_name_is_an_error() {
    let file = RolesFile::parse("[roles.relay]\nsession = \"  \"\n").unwrap();
    assert!(matches!(
        RoleResolver::new("/town", file).resolve(&AgentIdentity::relay()),
        Err(RoleError::EmptySessionName(_))
    ));
}

#[yare::parameterized(
    worker_named_monitor = { AgentIdentity::worker("gastown", "monitor") },
    worker_named_merger  = { AgentIdentity::worker("gastown", "merger") },
    crew_with_role_word  = { AgentIdentity::crew("gastown", "max-crew-b") },
    worker_without_name  = { AgentIdentity::worker("gastown", "") },
)]
fn reserved_agent_names_do_not_resolve(id: AgentIdentity) {
    assert!(matches!(
        RoleResolver::with_defaults("/town").resolve(&id),
        Err(RoleError::InvalidAgentName(_))
    ));
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(RolesFile::parse("[roles.worker]\nsesion = \"typo\"\n").is_err());
}

#[test]
fn load_missing_file_is_defaults() {
    let dir = tempdir().unwrap();
    let file = RolesFile::load(&dir.path().join("roles.toml")).unwrap();
    assert!(file.roles.is_empty());
}

#[test]
fn load_reads_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roles.toml");
    std::fs::write(&path, "[roles.crew]\ntheme = \"colour1\"\n").unwrap();
    let file = RolesFile::load(&path).unwrap();
    let resolved = RoleResolver::new("/town", file)
        .resolve(&AgentIdentity::crew("gastown", "max"))
        .unwrap();
    assert_eq!(resolved.theme.as_deref(), Some("colour1"));
}

#[test]
fn project_theme_is_stable() {
    let resolver = RoleResolver::with_defaults("/town");
    let a = resolver.resolve(&AgentIdentity::monitor("gastown")).unwrap();
    let b = resolver.resolve(&AgentIdentity::merger("gastown")).unwrap();
    assert_eq!(a.theme, b.theme);
    assert!(a.theme.is_some());
}
