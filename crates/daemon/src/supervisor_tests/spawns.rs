// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn announcement(ctx: &TestContext, id: &str, worker: &str, age: chrono::Duration) -> Message {
    Message::new(id, format!("{} {}", WORKER_STARTED_MARKER, worker))
        .sent_at(ctx.clock.utc_now() - age)
}

#[parameterized(
    short_form = { "WORKER_STARTED: gastown/nux" },
    address = { "WORKER_STARTED: gastown/workers/nux" },
    flat = { "WORKER_STARTED: gastown-worker-nux" },
    padded = { "  WORKER_STARTED:   gastown/nux  " },
)]
fn announcement_names_worker(subject: &str) {
    let spawn = PendingSpawn::from_message(&Message::new("hq-1", subject)).unwrap();

    assert_eq!(spawn.worker, AgentIdentity::worker("gastown", "nux"));
    assert_eq!(spawn.message_id, "hq-1");
}

#[parameterized(
    other_subject = { "Patrol report" },
    no_worker = { "WORKER_STARTED:" },
    not_a_worker = { "WORKER_STARTED: gastown-monitor" },
    monitor_address = { "WORKER_STARTED: gastown/monitor" },
    empty_name = { "WORKER_STARTED: gastown/" },
)]
fn non_announcements_are_ignored(subject: &str) {
    assert!(PendingSpawn::from_message(&Message::new("hq-1", subject)).is_none());
}

#[test]
fn announcement_expiry() {
    let now = chrono::Utc::now();
    let mut spawn = PendingSpawn {
        message_id: "hq-1".to_string(),
        worker: AgentIdentity::worker("gastown", "nux"),
        announced_at: None,
    };
    assert!(!spawn.is_expired(now));

    spawn.announced_at = Some(now - minutes(4));
    assert!(!spawn.is_expired(now));

    spawn.announced_at = Some(now - minutes(6));
    assert!(spawn.is_expired(now));
}

#[tokio::test(start_paused = true)]
async fn ready_worker_gets_propulsion_and_announcement_is_removed() {
    let ctx = setup();
    ctx.sessions.add_session("wd-gastown-nux", true);
    ctx.mail
        .deliver("relay/", announcement(&ctx, "hq-1", "gastown/nux", minutes(1)));

    ctx.supervisor.trigger_pending_spawns().await;

    assert_eq!(ctx.sessions.literals("wd-gastown-nux"), vec!["warden prime"]);
    assert_eq!(ctx.mail.deleted(), vec!["hq-1"]);
}

#[tokio::test(start_paused = true)]
async fn unready_worker_keeps_announcement() {
    let ctx = setup();
    ctx.sessions.add_session("wd-gastown-nux", false);
    ctx.mail
        .deliver("relay/", announcement(&ctx, "hq-1", "gastown/nux", minutes(1)));

    ctx.supervisor.trigger_pending_spawns().await;

    assert!(ctx.sessions.literals("wd-gastown-nux").is_empty());
    assert_eq!(ctx.mail.pending("relay/").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn expired_announcement_is_pruned_without_nudge() {
    let ctx = setup();
    ctx.sessions.add_session("wd-gastown-nux", true);
    ctx.mail
        .deliver("relay/", announcement(&ctx, "hq-1", "gastown/nux", minutes(6)));

    ctx.supervisor.trigger_pending_spawns().await;

    assert!(ctx.sessions.calls().is_empty());
    assert_eq!(ctx.mail.deleted(), vec!["hq-1"]);
}

#[tokio::test(start_paused = true)]
async fn lifecycle_requests_are_not_spawns() {
    let ctx = setup();
    let monitor = AgentIdentity::monitor("gastown");
    ctx.mail.deliver(
        "relay/",
        lifecycle_message(&ctx, "hq-2", &monitor, LifecycleAction::Cycle, minutes(1)),
    );

    ctx.supervisor.trigger_pending_spawns().await;

    assert_eq!(ctx.mail.pending("relay/").len(), 1);
    assert!(ctx.sessions.calls().is_empty());
}
