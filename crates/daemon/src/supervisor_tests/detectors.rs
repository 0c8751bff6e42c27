// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const BACKOFF_WAIT: std::time::Duration = std::time::Duration::from_secs(5 * 60);

fn gupp_age(offset_secs: i64) -> chrono::Duration {
    minutes(30) + chrono::Duration::seconds(offset_secs)
}

#[parameterized(
    just_under = { -1, 0 },
    exactly = { 0, 0 },
    just_over = { 1, 1 },
    long_over = { 3600, 1 },
)]
fn gupp_timeout_boundary(offset_secs: i64, expected: usize) {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async {
            let ctx = setup();
            ctx.ledger
                .put(hooked_worker(&ctx, "nux", AgentState::Working, gupp_age(offset_secs)));

            ctx.supervisor.scan_gupp_violations().await;

            assert_eq!(ctx.mail.sent_to("gastown/monitor").len(), expected);
            assert_eq!(state_writes(&ctx).len(), expected);
        });
}

#[tokio::test]
async fn gupp_violation_is_reported_once_and_marked_stuck() {
    let ctx = setup();
    let worker = AgentIdentity::worker("gastown", "nux");
    ctx.ledger
        .put(hooked_worker(&ctx, "nux", AgentState::Working, minutes(45)));

    ctx.supervisor.scan_gupp_violations().await;
    ctx.supervisor.scan_gupp_violations().await;

    let sent = ctx.mail.sent_to("gastown/monitor");
    assert_eq!(
        subjects(&sent),
        vec!["GUPP_VIOLATION: gastown/workers/nux has work on hook for 45m"]
    );
    assert!(sent[0].body.contains("hook_bead: gt-123"));
    assert_eq!(state_writes(&ctx), vec![(worker.clone(), PersistableState::Stuck)]);
    assert_eq!(ctx.ledger.get(&worker).unwrap().state, Some(AgentState::Stuck));
    // Never restarted
    assert!(ctx.sessions.calls().is_empty());
}

#[tokio::test]
async fn gupp_ignores_idle_and_inactive_workers() {
    let ctx = setup();
    ctx.ledger.put(
        AgentRecord::new(
            AgentIdentity::worker("gastown", "idle"),
            ctx.clock.utc_now() - minutes(90),
        )
        .with_state(AgentState::Working),
    );
    ctx.ledger
        .put(hooked_worker(&ctx, "done", AgentState::Done, minutes(90)));
    ctx.ledger
        .put(hooked_worker(&ctx, "gate", AgentState::AwaitingGate, minutes(90)));

    ctx.supervisor.scan_gupp_violations().await;

    assert!(ctx.mail.sent().is_empty());
}

#[tokio::test]
async fn gupp_send_failure_leaves_worker_unmarked() {
    let ctx = setup();
    ctx.ledger
        .put(hooked_worker(&ctx, "nux", AgentState::Working, minutes(45)));
    ctx.mail.set_fail_send(true);

    ctx.supervisor.scan_gupp_violations().await;

    assert!(state_writes(&ctx).is_empty());

    ctx.mail.set_fail_send(false);
    ctx.supervisor.scan_gupp_violations().await;
    assert_eq!(ctx.mail.sent().len(), 1);
}

#[tokio::test]
async fn unreadable_ledger_skips_scans() {
    let mut ctx = setup();
    ctx.ledger
        .put(hooked_worker(&ctx, "nux", AgentState::Dead, minutes(45)));
    ctx.ledger.set_fail_reads(true);

    ctx.supervisor.scan_gupp_violations().await;
    ctx.supervisor.scan_orphaned_work().await;
    ctx.supervisor.scan_crashed_workers().await;

    assert!(ctx.mail.sent().is_empty());
    assert!(ctx.sessions.calls().is_empty());
}

#[tokio::test]
async fn orphaned_work_notifies_monitor_with_backoff() {
    let mut ctx = setup();
    ctx.ledger
        .put(hooked_worker(&ctx, "nux", AgentState::Dead, minutes(1)));

    ctx.supervisor.scan_orphaned_work().await;
    ctx.supervisor.scan_orphaned_work().await;

    let sent = ctx.mail.sent_to("gastown/monitor");
    assert_eq!(
        subjects(&sent),
        vec!["ORPHANED_WORK: gastown/workers/nux is dead with work attached"]
    );
    assert!(sent[0].body.contains("hook_bead: gt-123"));

    ctx.clock.advance(BACKOFF_WAIT);
    ctx.supervisor.scan_orphaned_work().await;
    assert_eq!(ctx.mail.sent().len(), 2);
}

#[tokio::test]
async fn resolved_orphan_starts_fresh() {
    let mut ctx = setup();
    let record = hooked_worker(&ctx, "nux", AgentState::Dead, minutes(1));
    ctx.ledger.put(record.clone());
    ctx.supervisor.scan_orphaned_work().await;

    // Work reassigned, then the agent dies with work again
    ctx.ledger
        .put(AgentRecord::new(record.identity.clone(), record.updated_at).with_state(AgentState::Dead));
    ctx.supervisor.scan_orphaned_work().await;
    ctx.ledger.put(record);
    ctx.supervisor.scan_orphaned_work().await;

    assert_eq!(ctx.mail.sent().len(), 2);
}

#[tokio::test]
async fn orphan_scan_ignores_live_or_empty_agents() {
    let mut ctx = setup();
    ctx.ledger
        .put(hooked_worker(&ctx, "busy", AgentState::Working, minutes(1)));
    ctx.ledger.put(
        AgentRecord::new(AgentIdentity::worker("gastown", "gone"), ctx.clock.utc_now())
            .with_state(AgentState::Dead),
    );

    ctx.supervisor.scan_orphaned_work().await;

    assert!(ctx.mail.sent().is_empty());
}

#[tokio::test]
async fn orphaned_global_agent_is_reported_to_relay() {
    let mut ctx = setup();
    ctx.ledger.put(
        AgentRecord::new(AgentIdentity::coordinator(), ctx.clock.utc_now())
            .with_state(AgentState::Dead)
            .with_hook("hq-7"),
    );

    ctx.supervisor.scan_orphaned_work().await;

    assert_eq!(
        subjects(&ctx.mail.sent_to("relay/")),
        vec!["ORPHANED_WORK: coordinator/ is dead with work attached"]
    );
}

#[tokio::test(start_paused = true)]
async fn crashed_worker_is_restarted() {
    let mut ctx = setup();
    ctx.add_worker_dir("gastown", "nux");
    ctx.ledger
        .put(hooked_worker(&ctx, "nux", AgentState::Working, minutes(1)));

    ctx.supervisor.scan_crashed_workers().await;

    assert_eq!(ctx.sessions.create_count("wd-gastown-nux"), 1);
    assert!(nudges(&ctx, "wd-gastown-nux")[0].ends_with(" • crash-restart"));
    assert!(ctx.mail.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn crashed_worker_tree_is_synced_before_restart() {
    let mut ctx = setup();
    ctx.add_worker_dir("gastown", "nux");
    ctx.ledger
        .put(hooked_worker(&ctx, "nux", AgentState::Working, minutes(1)));

    ctx.supervisor.scan_crashed_workers().await;

    assert_eq!(ctx.sync.synced(), vec![ctx.root().join("gastown/workers/nux")]);
    assert_eq!(ctx.sessions.create_count("wd-gastown-nux"), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_crash_restart_notifies_monitor_once() {
    let mut ctx = setup();
    ctx.ledger
        .put(hooked_worker(&ctx, "nux", AgentState::Working, minutes(1)));

    ctx.supervisor.scan_crashed_workers().await;
    ctx.supervisor.scan_crashed_workers().await;

    let sent = ctx.mail.sent_to("gastown/monitor");
    assert_eq!(subjects(&sent), vec!["CRASHED_WORKER: gastown/nux restart failed"]);
    assert!(sent[0].body.contains("hook_bead: gt-123"));
    assert!(sent[0].body.contains("restart_error: working directory does not exist"));
}

#[tokio::test(start_paused = true)]
async fn crashed_worker_in_parked_project_is_reported_not_restarted() {
    let mut ctx = setup();
    ctx.add_worker_dir("gastown", "nux");
    ctx.set_project_settings("gastown", "status = \"parked\"");
    ctx.ledger
        .put(hooked_worker(&ctx, "nux", AgentState::Working, minutes(1)));

    ctx.supervisor.scan_crashed_workers().await;

    assert_eq!(ctx.sessions.create_count("wd-gastown-nux"), 0);
    let sent = ctx.mail.sent_to("gastown/monitor");
    assert!(sent[0].body.contains("project is parked"));
}

#[tokio::test(start_paused = true)]
async fn workers_with_session_or_no_hook_are_not_crashed() {
    let mut ctx = setup();
    ctx.add_worker_dir("gastown", "alive");
    ctx.add_worker_dir("gastown", "idle");
    ctx.sessions.add_session("wd-gastown-alive", true);
    ctx.ledger
        .put(hooked_worker(&ctx, "alive", AgentState::Working, minutes(1)));
    ctx.ledger.put(
        AgentRecord::new(AgentIdentity::worker("gastown", "idle"), ctx.clock.utc_now())
            .with_state(AgentState::Done),
    );

    ctx.supervisor.scan_crashed_workers().await;

    assert_eq!(ctx.sessions.create_count("wd-gastown-alive"), 0);
    assert_eq!(ctx.sessions.create_count("wd-gastown-idle"), 0);
    assert!(ctx.mail.sent().is_empty());
}
