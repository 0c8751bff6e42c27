// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn health_checks(ctx: &TestContext) -> usize {
    ctx.sessions
        .literals("wd-relay")
        .iter()
        .filter(|text| text.as_str() == HEALTH_CHECK_NUDGE)
        .count()
}

#[tokio::test(start_paused = true)]
async fn missing_heartbeat_file_is_ignored() {
    let mut ctx = setup();
    ctx.sessions.add_session("wd-relay", true);

    ctx.supervisor.check_relay_heartbeat().await;

    assert!(ctx.sessions.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn fresh_heartbeat_needs_nothing() {
    let mut ctx = setup();
    ctx.sessions.add_session("wd-relay", true);
    ctx.write_relay_heartbeat(minutes(14));

    ctx.supervisor.check_relay_heartbeat().await;

    assert!(ctx.sessions.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stale_heartbeat_without_session_is_left_to_triage() {
    let mut ctx = setup();
    ctx.write_relay_heartbeat(minutes(45));

    ctx.supervisor.check_relay_heartbeat().await;

    assert!(ctx.sessions.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stale_heartbeat_nudges_relay_with_backoff() {
    let mut ctx = setup();
    ctx.sessions.add_session("wd-relay", true);
    ctx.write_relay_heartbeat(minutes(20));

    ctx.supervisor.check_relay_heartbeat().await;
    assert_eq!(health_checks(&ctx), 1);

    // Backed off
    ctx.supervisor.check_relay_heartbeat().await;
    assert_eq!(health_checks(&ctx), 1);

    ctx.clock.advance(std::time::Duration::from_secs(5 * 60));
    ctx.write_relay_heartbeat(minutes(20));
    ctx.supervisor.check_relay_heartbeat().await;
    assert_eq!(health_checks(&ctx), 2);
    assert_eq!(ctx.sessions.kill_count("wd-relay"), 0);
}

#[tokio::test(start_paused = true)]
async fn fresh_heartbeat_resets_backoff() {
    let mut ctx = setup();
    ctx.sessions.add_session("wd-relay", true);

    ctx.write_relay_heartbeat(minutes(20));
    ctx.supervisor.check_relay_heartbeat().await;
    ctx.write_relay_heartbeat(minutes(1));
    ctx.supervisor.check_relay_heartbeat().await;
    ctx.write_relay_heartbeat(minutes(20));
    ctx.supervisor.check_relay_heartbeat().await;

    assert_eq!(health_checks(&ctx), 2);
}

#[tokio::test(start_paused = true)]
async fn very_stale_heartbeat_kills_relay() {
    let mut ctx = setup();
    ctx.sessions.add_session("wd-relay", true);
    ctx.write_relay_heartbeat(minutes(31));

    ctx.supervisor.check_relay_heartbeat().await;

    assert_eq!(ctx.sessions.kill_count("wd-relay"), 1);
    assert_eq!(health_checks(&ctx), 0);
    assert_eq!(ctx.sessions.create_count("wd-relay"), 0);
}

#[test]
fn heartbeat_file_parses_with_optional_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("heartbeat.json");
    std::fs::write(&path, r#"{"timestamp": "2026-01-02T03:04:05Z"}"#).unwrap();

    let heartbeat = RelayHeartbeat::read(&path).unwrap();

    assert_eq!(heartbeat.cycle, 0);
    assert_eq!(heartbeat.timestamp.to_rfc3339(), "2026-01-02T03:04:05+00:00");
}

#[test]
fn unreadable_heartbeat_file_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("heartbeat.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(RelayHeartbeat::read(&path).is_none());
    assert!(RelayHeartbeat::read(&dir.path().join("missing.json")).is_none());
}

#[tokio::test(start_paused = true)]
async fn monitors_and_mergers_started_per_project() {
    let ctx = setup();
    ctx.add_project("gastown");
    ctx.add_project("beads");
    let projects = ctx.supervisor.projects();

    ctx.supervisor.ensure_monitors_running(&projects).await;
    ctx.supervisor.ensure_mergers_running(&projects).await;

    for session in [
        "wd-gastown-monitor",
        "wd-gastown-merger",
        "wd-beads-monitor",
        "wd-beads-merger",
    ] {
        assert_eq!(ctx.sessions.create_count(session), 1, "{session}");
    }
}

#[tokio::test(start_paused = true)]
async fn parked_project_agents_are_skipped() {
    let ctx = setup();
    ctx.add_project("gastown");
    ctx.add_project("beads");
    ctx.set_project_settings("beads", "status = \"parked\"");
    let projects = ctx.supervisor.projects();

    ctx.supervisor.ensure_monitors_running(&projects).await;
    ctx.supervisor.ensure_mergers_running(&projects).await;

    assert_eq!(ctx.sessions.create_count("wd-gastown-monitor"), 1);
    assert_eq!(ctx.sessions.create_count("wd-beads-monitor"), 0);
    assert_eq!(ctx.sessions.create_count("wd-beads-merger"), 0);
}
