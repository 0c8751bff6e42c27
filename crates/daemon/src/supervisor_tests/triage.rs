// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test(start_paused = true)]
async fn spawns_fresh_triage_when_not_running() {
    let ctx = setup();

    ctx.supervisor.ensure_watchdog_running().await;

    assert_eq!(ctx.sessions.create_count("wd-triage"), 1);
    assert_eq!(ctx.sessions.create_count("wd-relay"), 0);
    assert!(TriageStatus::load(&ctx.config.triage_path).is_none());
}

#[tokio::test(start_paused = true)]
async fn creates_missing_triage_directory() {
    let ctx = setup();
    std::fs::remove_dir_all(ctx.root().join("relay/triage")).unwrap();

    ctx.supervisor.ensure_watchdog_running().await;

    assert!(ctx.root().join("relay/triage").is_dir());
    assert_eq!(ctx.sessions.create_count("wd-triage"), 1);
}

#[tokio::test(start_paused = true)]
async fn running_triage_is_left_alone() {
    let ctx = setup();
    ctx.sessions.add_session("wd-triage", true);

    ctx.supervisor.ensure_watchdog_running().await;

    assert!(ctx.sessions.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_triage_spawn_falls_back_to_relay() {
    let ctx = setup();
    ctx.sessions.fail_create(Some("no server running"));

    ctx.supervisor.ensure_watchdog_running().await;

    assert_eq!(ctx.sessions.create_count("wd-triage"), 1);
    assert_eq!(ctx.sessions.create_count("wd-relay"), 1);
}

#[tokio::test(start_paused = true)]
async fn degraded_mode_starts_relay_and_records_it() {
    let mut ctx = setup();
    ctx.supervisor.config.degraded = true;

    ctx.supervisor.ensure_watchdog_running().await;

    assert_eq!(ctx.sessions.create_count("wd-triage"), 0);
    assert_eq!(ctx.sessions.create_count("wd-relay"), 1);
    let status = TriageStatus::load(&ctx.config.triage_path).unwrap();
    assert!(!status.running);
    assert_eq!(status.last_action, "start");
    assert_eq!(status.target.as_deref(), Some("relay"));
    assert_eq!(status.completed_at, Some(ctx.clock.utc_now()));
    assert!(status.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn unavailable_tmux_falls_back_to_mechanical_triage() {
    let ctx = setup();
    ctx.sessions.set_available(false);
    ctx.sessions.add_session("wd-relay", true);

    ctx.supervisor.ensure_watchdog_running().await;

    assert_eq!(ctx.sessions.create_count("wd-triage"), 0);
    assert_eq!(ctx.sessions.create_count("wd-relay"), 0);
    let status = TriageStatus::load(&ctx.config.triage_path).unwrap();
    assert_eq!(status.last_action, "nothing");
    assert!(status.target.is_none());
}

#[test]
fn triage_status_omits_unset_fields() {
    let status = TriageStatus {
        last_action: "nothing".to_string(),
        ..TriageStatus::default()
    };

    let json = serde_json::to_value(&status).unwrap();

    assert_eq!(json, serde_json::json!({ "running": false, "last_action": "nothing" }));
}
