// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test(start_paused = true)]
async fn cycle_request_recreates_session_and_nudges_in_order() {
    let ctx = setup();
    ctx.add_project("gastown");
    let merger = AgentIdentity::merger("gastown");
    ctx.sessions.add_session("wd-gastown-merger", true);
    ctx.mail.deliver(
        "relay/",
        lifecycle_message(&ctx, "hq-1", &merger, LifecycleAction::Cycle, minutes(1)),
    );

    ctx.supervisor.process_lifecycle_requests().await;

    assert!(ctx.mail.pending("relay/").is_empty());
    assert_eq!(ctx.mail.deleted(), vec!["hq-1"]);
    assert_eq!(ctx.sessions.kill_count("wd-gastown-merger"), 1);
    assert_eq!(ctx.sessions.create_count("wd-gastown-merger"), 1);
    assert_eq!(ctx.sync.synced(), vec![ctx.root().join("gastown/merger/rig")]);

    let nudges = nudges(&ctx, "wd-gastown-merger");
    assert_eq!(nudges.len(), 2);
    assert!(nudges[0].starts_with("[warden] gastown/merger <- supervisor"));
    assert!(nudges[0].ends_with(" • cycle"));
    assert_eq!(nudges[1], "warden prime");
    let times = literal_times(&ctx, "wd-gastown-merger");
    assert!(times[2] - times[1] >= PROPULSION_DELAY);
}

#[tokio::test(start_paused = true)]
async fn restart_request_recreates_crew_member() {
    let ctx = setup();
    let crew = AgentIdentity::crew("gastown", "max");
    std::fs::create_dir_all(ctx.root().join("gastown/crew/max")).unwrap();
    ctx.sessions.add_session("wd-gastown-crew-max", true);
    ctx.mail.deliver(
        "relay/",
        lifecycle_message(&ctx, "hq-2", &crew, LifecycleAction::Restart, minutes(1)),
    );

    ctx.supervisor.process_lifecycle_requests().await;

    assert_eq!(ctx.sessions.kill_count("wd-gastown-crew-max"), 1);
    assert_eq!(ctx.sessions.create_count("wd-gastown-crew-max"), 1);
    assert_eq!(ctx.sync.synced(), vec![ctx.root().join("gastown/crew/max")]);
    assert!(nudges(&ctx, "wd-gastown-crew-max")[0].ends_with(" • restart"));
}

#[tokio::test(start_paused = true)]
async fn shutdown_request_only_kills() {
    let ctx = setup();
    ctx.add_project("gastown");
    ctx.sessions.add_session("wd-gastown-monitor", true);
    let monitor = AgentIdentity::monitor("gastown");
    ctx.mail.deliver(
        "relay/",
        lifecycle_message(&ctx, "hq-3", &monitor, LifecycleAction::Shutdown, minutes(1)),
    );

    ctx.supervisor.process_lifecycle_requests().await;

    assert_eq!(ctx.sessions.kill_count("wd-gastown-monitor"), 1);
    assert_eq!(ctx.sessions.create_count("wd-gastown-monitor"), 0);
    assert!(ctx.mail.pending("relay/").is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_of_absent_session_is_a_no_op() {
    let ctx = setup();
    let monitor = AgentIdentity::monitor("gastown");
    ctx.mail.deliver(
        "relay/",
        lifecycle_message(&ctx, "hq-4", &monitor, LifecycleAction::Shutdown, minutes(1)),
    );

    ctx.supervisor.process_lifecycle_requests().await;

    assert!(ctx.sessions.calls().is_empty());
    assert_eq!(ctx.mail.deleted(), vec!["hq-4"]);
}

#[tokio::test(start_paused = true)]
async fn request_is_claimed_even_when_execution_fails() {
    let ctx = setup();
    // No working directory: recreate fails after the kill
    let worker = AgentIdentity::worker("gastown", "nux");
    ctx.sessions.add_session("wd-gastown-nux", true);
    ctx.mail.deliver(
        "relay/",
        lifecycle_message(&ctx, "hq-5", &worker, LifecycleAction::Cycle, minutes(1)),
    );

    ctx.supervisor.process_lifecycle_requests().await;

    assert_eq!(ctx.mail.deleted(), vec!["hq-5"]);
    assert_eq!(ctx.sessions.create_count("wd-gastown-nux"), 0);

    // Not retried
    ctx.supervisor.process_lifecycle_requests().await;
    assert_eq!(ctx.sessions.kill_count("wd-gastown-nux"), 1);
}

#[tokio::test(start_paused = true)]
async fn unclaimable_request_is_not_executed() {
    let ctx = setup();
    ctx.add_project("gastown");
    ctx.sessions.add_session("wd-gastown-monitor", true);
    let monitor = AgentIdentity::monitor("gastown");
    ctx.mail.deliver(
        "relay/",
        lifecycle_message(&ctx, "hq-6", &monitor, LifecycleAction::Cycle, minutes(1)),
    );
    ctx.mail.set_fail_delete(true);

    ctx.supervisor.process_lifecycle_requests().await;

    assert!(ctx.sessions.calls().is_empty());
    assert_eq!(ctx.mail.pending("relay/").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stale_request_is_discarded_unexecuted() {
    let ctx = setup();
    ctx.add_project("gastown");
    ctx.sessions.add_session("wd-gastown-monitor", true);
    let monitor = AgentIdentity::monitor("gastown");
    ctx.mail.deliver(
        "relay/",
        lifecycle_message(&ctx, "hq-7", &monitor, LifecycleAction::Cycle, minutes(7 * 60)),
    );

    ctx.supervisor.process_lifecycle_requests().await;

    assert_eq!(ctx.mail.deleted(), vec!["hq-7"]);
    assert!(ctx.sessions.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn request_without_timestamp_is_fresh() {
    let ctx = setup();
    ctx.add_project("gastown");
    ctx.sessions.add_session("wd-gastown-monitor", true);
    let monitor = AgentIdentity::monitor("gastown");
    ctx.mail.deliver(
        "relay/",
        Message::new("hq-8", LifecycleRequest::subject(&monitor, LifecycleAction::Shutdown)),
    );

    ctx.supervisor.process_lifecycle_requests().await;

    assert_eq!(ctx.sessions.kill_count("wd-gastown-monitor"), 1);
}

#[tokio::test(start_paused = true)]
async fn unparseable_request_is_discarded() {
    let ctx = setup();
    ctx.mail.deliver(
        "relay/",
        Message::new("hq-9", "LIFECYCLE: gastown/monitor requesting a holiday"),
    );

    ctx.supervisor.process_lifecycle_requests().await;

    assert_eq!(ctx.mail.deleted(), vec!["hq-9"]);
    assert!(ctx.sessions.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn other_mail_is_left_alone() {
    let ctx = setup();
    ctx.mail.deliver("relay/", Message::new("hq-10", "Patrol report"));
    let mut closed = Message::new(
        "hq-11",
        LifecycleRequest::subject(&AgentIdentity::relay(), LifecycleAction::Cycle),
    );
    closed.status = "closed".to_string();
    ctx.mail.deliver("relay/", closed);

    ctx.supervisor.process_lifecycle_requests().await;

    assert_eq!(ctx.mail.pending("relay/").len(), 2);
    assert!(ctx.mail.deleted().is_empty());
    assert!(ctx.sessions.calls().is_empty());
}
