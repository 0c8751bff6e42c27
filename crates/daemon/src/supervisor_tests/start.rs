// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[tokio::test(start_paused = true)]
async fn starts_absent_agent_with_environment_and_nudges() {
    let ctx = setup();
    ctx.add_project("gastown");
    let monitor = AgentIdentity::monitor("gastown");

    let outcome = ctx
        .supervisor
        .ensure_running(&monitor, StartMode::Start)
        .await
        .unwrap();

    assert_eq!(outcome, StartOutcome::Started);
    let session = ctx.sessions.get_session("wd-gastown-monitor").unwrap();
    assert_eq!(session.cwd, ctx.root().join("gastown"));
    assert!(session
        .env
        .contains(&("WARDEN_ROLE".to_string(), "monitor".to_string())));
    assert!(session
        .env
        .contains(&("BD_ACTOR".to_string(), "gastown/monitor".to_string())));
    assert_eq!(session.style.unwrap().title.as_deref(), Some("gastown/monitor"));

    let literals = ctx.sessions.literals("wd-gastown-monitor");
    assert_eq!(literals[0], ctx.role(&monitor).start_command);
    let nudges = nudges(&ctx, "wd-gastown-monitor");
    assert_eq!(nudges.len(), 2);
    assert!(nudges[0].starts_with("[warden] gastown/monitor <- supervisor • "));
    assert!(nudges[0].ends_with(" • start"));
    assert_eq!(nudges[1], "warden prime");
}

#[tokio::test(start_paused = true)]
async fn ensure_running_twice_touches_nothing_the_second_time() {
    let ctx = setup();
    ctx.add_project("gastown");
    let monitor = AgentIdentity::monitor("gastown");

    ctx.supervisor
        .ensure_running(&monitor, StartMode::Start)
        .await
        .unwrap();
    ctx.sessions.clear_calls();

    let outcome = ctx
        .supervisor
        .ensure_running(&monitor, StartMode::Start)
        .await
        .unwrap();

    assert_eq!(outcome, StartOutcome::AlreadyRunning);
    assert!(ctx.sessions.calls().is_empty(), "{:?}", ctx.sessions.calls());
}

#[tokio::test(start_paused = true)]
async fn zombie_session_is_killed_before_recreating() {
    let ctx = setup();
    ctx.add_project("gastown");
    ctx.sessions.add_session("wd-gastown-monitor", false);

    let outcome = ctx
        .supervisor
        .ensure_running(&AgentIdentity::monitor("gastown"), StartMode::Start)
        .await
        .unwrap();

    assert_eq!(outcome, StartOutcome::Started);
    let calls = ctx.sessions.calls();
    let kill = calls
        .iter()
        .position(|c| matches!(c, SessionCall::Kill { name } if name == "wd-gastown-monitor"))
        .unwrap();
    let create = calls
        .iter()
        .position(|c| matches!(c, SessionCall::Create { name, .. } if name == "wd-gastown-monitor"))
        .unwrap();
    assert!(kill < create);
    assert_eq!(ctx.sessions.create_count("wd-gastown-monitor"), 1);
}

#[tokio::test(start_paused = true)]
async fn blocked_projects_are_never_started() {
    let cases = [
        ("status = \"parked\"", "project is parked"),
        ("status = \"docked\"", "project is docked"),
        ("auto_restart = false", "auto_restart is disabled"),
    ];
    for (settings, expected) in cases {
        let ctx = setup();
        ctx.add_project("gastown");
        ctx.set_project_settings("gastown", settings);

        let result = ctx
            .supervisor
            .ensure_running(&AgentIdentity::merger("gastown"), StartMode::Start)
            .await;

        match result {
            Err(StartError::Blocked { project, reason }) => {
                assert_eq!(project, "gastown");
                assert_eq!(reason, expected);
            }
            other => panic!("{settings}: expected Blocked, got {:?}", other),
        }
        assert!(ctx.sessions.calls().is_empty());
        assert!(ctx.sync.synced().is_empty());
    }
}

#[tokio::test(start_paused = true)]
async fn active_settings_do_not_block() {
    let ctx = setup();
    ctx.add_project("gastown");
    ctx.set_project_settings("gastown", "status = \"active\"\nauto_restart = true\n");

    let outcome = ctx
        .supervisor
        .ensure_running(&AgentIdentity::monitor("gastown"), StartMode::Start)
        .await
        .unwrap();

    assert_eq!(outcome, StartOutcome::Started);
}

#[tokio::test(start_paused = true)]
async fn missing_work_dir_fails_without_creating_session() {
    let ctx = setup();
    let worker = AgentIdentity::worker("gastown", "nux");

    let result = ctx
        .supervisor
        .ensure_running(&worker, StartMode::CrashRestart)
        .await;

    assert!(matches!(result, Err(StartError::MissingWorkDir(_))));
    assert_eq!(ctx.sessions.create_count("wd-gastown-nux"), 0);
}

#[tokio::test(start_paused = true)]
async fn merger_is_pre_synced_before_start() {
    let ctx = setup();
    ctx.add_project("gastown");

    ctx.supervisor
        .ensure_running(&AgentIdentity::merger("gastown"), StartMode::Start)
        .await
        .unwrap();

    assert_eq!(ctx.sync.synced(), vec![ctx.root().join("gastown/merger/rig")]);
}

#[tokio::test(start_paused = true)]
async fn failed_pre_sync_still_starts() {
    let ctx = setup();
    ctx.add_project("gastown");
    ctx.sync.set_fail(true);

    let outcome = ctx
        .supervisor
        .ensure_running(&AgentIdentity::merger("gastown"), StartMode::Start)
        .await
        .unwrap();

    assert_eq!(outcome, StartOutcome::Started);
    assert_eq!(ctx.sessions.create_count("wd-gastown-merger"), 1);
}

#[tokio::test(start_paused = true)]
async fn monitor_is_not_pre_synced() {
    let ctx = setup();
    ctx.add_project("gastown");

    ctx.supervisor
        .ensure_running(&AgentIdentity::monitor("gastown"), StartMode::Start)
        .await
        .unwrap();

    assert!(ctx.sync.synced().is_empty());
}

#[tokio::test(start_paused = true)]
async fn propulsion_follows_startup_nudge_after_delay() {
    let ctx = setup();
    ctx.add_project("gastown");

    ctx.supervisor
        .ensure_running(&AgentIdentity::monitor("gastown"), StartMode::Start)
        .await
        .unwrap();

    let times = literal_times(&ctx, "wd-gastown-monitor");
    assert_eq!(times.len(), 3);
    assert!(times[2] - times[1] >= PROPULSION_DELAY);
}

#[tokio::test(start_paused = true)]
async fn create_failure_is_reported() {
    let ctx = setup();
    ctx.add_project("gastown");
    ctx.sessions.fail_create(Some("no server running"));

    let result = ctx
        .supervisor
        .ensure_running(&AgentIdentity::monitor("gastown"), StartMode::Start)
        .await;

    assert!(matches!(result, Err(StartError::Session(_))));
    assert!(ctx.sessions.literals("wd-gastown-monitor").is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_program_is_still_nudged() {
    let ctx = setup();
    ctx.add_project("gastown");
    ctx.sessions.set_programs_start(false);

    let outcome = ctx
        .supervisor
        .ensure_running(&AgentIdentity::monitor("gastown"), StartMode::Start)
        .await
        .unwrap();

    assert_eq!(outcome, StartOutcome::Started);
    assert_eq!(nudges(&ctx, "wd-gastown-monitor").len(), 2);
}

#[tokio::test(start_paused = true)]
async fn recreate_kills_live_session() {
    let ctx = setup();
    ctx.add_project("gastown");
    ctx.sessions.add_session("wd-gastown-monitor", true);

    let outcome = ctx
        .supervisor
        .recreate(&AgentIdentity::monitor("gastown"), StartMode::Restart)
        .await
        .unwrap();

    assert_eq!(outcome, StartOutcome::Started);
    assert_eq!(ctx.sessions.kill_count("wd-gastown-monitor"), 1);
    assert_eq!(ctx.sessions.create_count("wd-gastown-monitor"), 1);
    assert!(nudges(&ctx, "wd-gastown-monitor")[0].ends_with(" • restart"));
}

#[parameterized(
    start = { StartMode::Start, "start" },
    cycle = { StartMode::Cycle, "cycle" },
    restart = { StartMode::Restart, "restart" },
    crash = { StartMode::CrashRestart, "crash-restart" },
)]
fn start_mode_display(mode: StartMode, expected: &str) {
    assert_eq!(mode.to_string(), expected);
}

#[test]
fn startup_nudge_names_agent_time_and_mode() {
    let ctx = setup();
    let now = ctx.clock.utc_now().to_rfc3339();

    let text = ctx
        .supervisor
        .startup_nudge(&AgentIdentity::relay(), StartMode::Cycle);

    assert_eq!(text, format!("[warden] relay/ <- supervisor • {} • cycle", now));
}
