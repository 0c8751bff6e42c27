// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn liveness_distinguishes_absent_zombie_and_running() {
    let ctx = setup();
    let relay = ctx.role(&AgentIdentity::relay());

    assert_eq!(ctx.supervisor.liveness(&relay).await, Liveness::Absent);

    ctx.sessions.add_session("wd-relay", false);
    assert_eq!(ctx.supervisor.liveness(&relay).await, Liveness::Zombie);

    ctx.sessions.set_program_running("wd-relay", true);
    assert_eq!(ctx.supervisor.liveness(&relay).await, Liveness::Running);
}

#[tokio::test]
async fn alive_means_session_exists_even_without_program() {
    let ctx = setup();
    let worker = AgentIdentity::worker("gastown", "nux");
    ctx.sessions.add_session("wd-gastown-nux", false);

    assert!(ctx.supervisor.is_alive(&worker).await);
    assert!(!ctx.supervisor.is_program_running(&worker).await);
}

#[tokio::test]
async fn nothing_is_alive_in_an_empty_server() {
    let ctx = setup();
    let coordinator = AgentIdentity::coordinator();

    assert!(!ctx.supervisor.is_alive(&coordinator).await);
    assert!(!ctx.supervisor.is_program_running(&coordinator).await);
}

#[tokio::test(start_paused = true)]
async fn wait_for_program_sees_late_start() {
    let ctx = setup();
    let relay = ctx.role(&AgentIdentity::relay());
    ctx.sessions.add_session("wd-relay", false);

    let sessions = ctx.sessions.clone();
    let starter = async move {
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        sessions.set_program_running("wd-relay", true);
    };
    let (ready, ()) = tokio::join!(
        ctx.supervisor
            .wait_for_program(&relay, std::time::Duration::from_secs(5)),
        starter
    );

    assert!(ready);
}

#[tokio::test(start_paused = true)]
async fn wait_for_program_gives_up_at_timeout() {
    let ctx = setup();
    let relay = ctx.role(&AgentIdentity::relay());
    ctx.sessions.add_session("wd-relay", false);
    let started = tokio::time::Instant::now();

    let ready = ctx
        .supervisor
        .wait_for_program(&relay, std::time::Duration::from_secs(3))
        .await;

    assert!(!ready);
    assert!(started.elapsed() >= std::time::Duration::from_secs(3));
}
