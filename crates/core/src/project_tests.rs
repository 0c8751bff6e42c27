// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[yare::parameterized(
    empty              = { "",                                          None },
    active             = { "status = \"active\"",                       None },
    parked             = { "status = \"parked\"",                       Some("project is parked") },
    docked             = { "status = \"docked\"",                       Some("project is docked") },
    auto_restart_off   = { "auto_restart = false",                      Some("auto_restart is disabled") },
    auto_restart_on    = { "auto_restart = true",                       None },
    parked_and_enabled = { "status = \"parked\"\nauto_restart = true", Some("project is parked") },
)]
fn blocked_reason(toml_src: &str, expected: Option<&str>) {
    let settings: ProjectSettings = toml::from_str(toml_src).unwrap();
    assert_eq!(settings.blocked_reason(), expected);
}

#[test]
fn missing_settings_file_is_active() {
    let dir = tempdir().unwrap();
    let settings = ProjectSettings::load(dir.path(), "gastown").unwrap();
    assert_eq!(settings, ProjectSettings::default());
}

#[test]
fn settings_load_from_project_dir() {
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("gastown")).unwrap();
    std::fs::write(
        ProjectSettings::path(dir.path(), "gastown"),
        "status = \"docked\"\n",
    )
    .unwrap();
    let settings = ProjectSettings::load(dir.path(), "gastown").unwrap();
    assert_eq!(settings.status, ProjectStatus::Docked);
}

#[test]
fn invalid_settings_are_an_error() {
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("gastown")).unwrap();
    std::fs::write(
        ProjectSettings::path(dir.path(), "gastown"),
        "status = \"sunk\"\n",
    )
    .unwrap();
    assert!(matches!(
        ProjectSettings::load(dir.path(), "gastown"),
        Err(ProjectError::Toml { .. })
    ));
}

#[test]
fn registry_lists_projects_in_order() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("projects.json"),
        r#"{"projects": {"zeta": {}, "beads": {"git_url": "x"}, "gastown": null}}"#,
    )
    .unwrap();
    assert_eq!(
        load_registry(dir.path()).unwrap(),
        vec!["beads", "gastown", "zeta"]
    );
}

#[test]
fn missing_registry_is_empty() {
    let dir = tempdir().unwrap();
    assert!(load_registry(dir.path()).unwrap().is_empty());
}
