// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::session::NUDGE_KEY_PAUSE;
use std::time::Duration;

#[tokio::test]
async fn create_records_call_and_session() {
    let adapter = FakeSessionAdapter::new();
    adapter.create("wd-relay", Path::new("/town/relay")).await.unwrap();

    assert!(adapter.has_session("wd-relay").await.unwrap());
    assert!(adapter.is_program_running("wd-relay", "claude").await.unwrap());
    assert_eq!(adapter.create_count("wd-relay"), 1);
    assert_eq!(
        adapter.get_session("wd-relay").unwrap().cwd,
        PathBuf::from("/town/relay")
    );
}

#[tokio::test]
async fn create_existing_session_fails() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session("wd-relay", true);
    let result = adapter.create("wd-relay", Path::new("/tmp")).await;
    assert!(matches!(result, Err(SessionError::AlreadyExists(_))));
}

#[tokio::test]
async fn kill_removes_session() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session("wd-relay", true);
    adapter.kill("wd-relay").await.unwrap();
    assert!(!adapter.has_session("wd-relay").await.unwrap());
    assert_eq!(adapter.kill_count("wd-relay"), 1);
}

#[tokio::test]
async fn send_to_missing_session_is_not_found() {
    let adapter = FakeSessionAdapter::new();
    let result = adapter.send_literal("nope", "hi").await;
    assert!(matches!(result, Err(SessionError::NotFound(_))));
}

#[tokio::test]
async fn injected_create_failure() {
    let adapter = FakeSessionAdapter::new();
    adapter.fail_create(Some("no space"));
    let result = adapter.create("wd-relay", Path::new("/tmp")).await;
    assert!(matches!(result, Err(SessionError::CreateFailed(ref m)) if m == "no space"));
    assert!(!adapter.has_session("wd-relay").await.unwrap());
}

#[tokio::test]
async fn send_keys_is_literal_then_enter() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session("s", false);
    adapter.send_keys("s", "exec claude").await.unwrap();

    let calls = adapter.calls();
    assert!(matches!(&calls[0], SessionCall::SendLiteral { text, .. } if text == "exec claude"));
    assert!(matches!(&calls[1], SessionCall::SendEnter { .. }));
}

#[tokio::test(start_paused = true)]
async fn nudge_clears_input_then_settles_before_enter() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session("s", true);
    let start = tokio::time::Instant::now();

    adapter.nudge("s", "warden prime").await.unwrap();

    let calls = adapter.calls();
    assert!(matches!(&calls[0], SessionCall::SendKey { key, .. } if key == "Escape"));
    assert!(matches!(&calls[1], SessionCall::SendKey { key, .. } if key == "Escape"));
    match &calls[2] {
        SessionCall::SendLiteral { text, at, .. } => {
            assert_eq!(text, "warden prime");
            assert_eq!(*at - start, NUDGE_KEY_PAUSE * 2);
        }
        other => panic!("unexpected call {:?}", other),
    }
    assert!(matches!(&calls[3], SessionCall::SendEnter { .. }));
    assert!(start.elapsed() >= Duration::from_millis(100 + 50 * 2));
}

#[tokio::test(start_paused = true)]
async fn send_keys_delayed_waits() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session("s", true);
    let start = tokio::time::Instant::now();

    adapter
        .send_keys_delayed("s", "warden prime", Duration::from_secs(2))
        .await
        .unwrap();

    match &adapter.calls()[0] {
        SessionCall::SendLiteral { at, .. } => assert!(*at - start >= Duration::from_secs(2)),
        other => panic!("unexpected call {:?}", other),
    }
}

#[tokio::test]
async fn ensure_fresh_kills_zombie_and_recreates() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session("s", false);

    adapter
        .ensure_fresh("s", Path::new("/tmp"), "claude")
        .await
        .unwrap();

    assert_eq!(adapter.kill_count("s"), 1);
    assert_eq!(adapter.create_count("s"), 1);
}

#[tokio::test]
async fn ensure_fresh_leaves_running_session_alone() {
    let adapter = FakeSessionAdapter::new();
    adapter.add_session("s", true);

    let result = adapter.ensure_fresh("s", Path::new("/tmp"), "claude").await;

    assert!(matches!(result, Err(SessionError::AlreadyExists(_))));
    assert_eq!(adapter.kill_count("s"), 0);
    assert_eq!(adapter.create_count("s"), 0);
}
