// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::lifecycle::{startup, DaemonState};
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::test(start_paused = true)]
async fn tick_covers_every_agent_kind() {
    let mut ctx = setup();
    ctx.add_project("gastown");
    ctx.add_worker_dir("gastown", "nux");
    ctx.ledger
        .put(hooked_worker(&ctx, "toast", AgentState::Working, minutes(45)));
    ctx.sessions.add_session("wd-gastown-toast", true);
    ctx.ledger
        .put(hooked_worker(&ctx, "nux", AgentState::Working, minutes(1)));

    ctx.supervisor.tick().await;

    for session in [
        "wd-triage",
        "wd-gastown-monitor",
        "wd-gastown-merger",
        "wd-gastown-nux",
    ] {
        assert_eq!(ctx.sessions.create_count(session), 1, "{session}");
    }
    assert_eq!(
        subjects(&ctx.mail.sent_to("gastown/monitor")),
        vec!["GUPP_VIOLATION: gastown/workers/toast has work on hook for 45m"]
    );
}

#[tokio::test(start_paused = true)]
async fn second_tick_rediscovers_and_leaves_healthy_agents_alone() {
    let mut ctx = setup();
    ctx.add_project("gastown");

    ctx.supervisor.tick().await;
    ctx.sessions.clear_calls();
    // Triage is disposable; it exits once it has looked at the relay
    ctx.sessions.remove_session("wd-triage");
    ctx.supervisor.tick().await;

    assert_eq!(ctx.sessions.create_count("wd-triage"), 1);
    assert_eq!(ctx.sessions.create_count("wd-gastown-monitor"), 0);
    assert_eq!(ctx.sessions.create_count("wd-gastown-merger"), 0);
    assert_eq!(ctx.sessions.kill_count("wd-gastown-monitor"), 0);
}

#[tokio::test(start_paused = true)]
async fn first_tick_runs_immediately_and_records_heartbeat() {
    let mut ctx = setup();
    let mut daemon = startup(&ctx.config).unwrap();
    let (tx, rx) = mpsc::channel(8);

    let stopper = async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        tx.send(ControlSignal::Shutdown).await.unwrap();
    };
    tokio::join!(
        run_loop(&mut ctx.supervisor, &mut daemon, rx, HEARTBEAT_INTERVAL),
        stopper
    );

    assert_eq!(daemon.state.heartbeat_count, 1);
    assert_eq!(daemon.state.last_heartbeat, Some(ctx.clock.utc_now()));
    let saved = DaemonState::load(&ctx.config.state_path).unwrap().unwrap();
    assert_eq!(saved.heartbeat_count, 1);
    assert_eq!(ctx.sessions.create_count("wd-triage"), 1);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_repeats_on_interval() {
    let mut ctx = setup();
    let mut daemon = startup(&ctx.config).unwrap();
    let (tx, rx) = mpsc::channel(8);

    let stopper = async move {
        tokio::time::sleep(HEARTBEAT_INTERVAL * 2 + Duration::from_secs(30)).await;
        tx.send(ControlSignal::Shutdown).await.unwrap();
    };
    tokio::join!(
        run_loop(&mut ctx.supervisor, &mut daemon, rx, HEARTBEAT_INTERVAL),
        stopper
    );

    assert_eq!(daemon.state.heartbeat_count, 3);
}

#[tokio::test(start_paused = true)]
async fn queued_shutdown_wins_over_due_tick() {
    let mut ctx = setup();
    let mut daemon = startup(&ctx.config).unwrap();
    let (tx, rx) = mpsc::channel(8);
    tx.send(ControlSignal::Shutdown).await.unwrap();

    run_loop(&mut ctx.supervisor, &mut daemon, rx, HEARTBEAT_INTERVAL).await;

    assert_eq!(daemon.state.heartbeat_count, 0);
    assert!(ctx.sessions.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn process_now_drains_lifecycle_requests_without_a_tick() {
    let mut ctx = setup();
    ctx.add_project("gastown");
    ctx.sessions.add_session("wd-gastown-monitor", true);
    let monitor = AgentIdentity::monitor("gastown");
    ctx.mail.deliver(
        "relay/",
        lifecycle_message(&ctx, "hq-1", &monitor, LifecycleAction::Shutdown, minutes(1)),
    );
    let mut daemon = startup(&ctx.config).unwrap();
    let (tx, rx) = mpsc::channel(8);
    tx.send(ControlSignal::ProcessNow).await.unwrap();
    tx.send(ControlSignal::Shutdown).await.unwrap();

    run_loop(&mut ctx.supervisor, &mut daemon, rx, HEARTBEAT_INTERVAL).await;

    assert_eq!(ctx.sessions.kill_count("wd-gastown-monitor"), 1);
    assert_eq!(ctx.mail.deleted(), vec!["hq-1"]);
    assert_eq!(daemon.state.heartbeat_count, 0);
}

#[tokio::test(start_paused = true)]
async fn closed_control_channel_stops_loop() {
    let mut ctx = setup();
    let mut daemon = startup(&ctx.config).unwrap();
    let (tx, rx) = mpsc::channel::<ControlSignal>(1);
    drop(tx);

    run_loop(&mut ctx.supervisor, &mut daemon, rx, HEARTBEAT_INTERVAL).await;

    assert_eq!(daemon.state.heartbeat_count, 0);
}
