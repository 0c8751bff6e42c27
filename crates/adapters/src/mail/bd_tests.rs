// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::bd::script::{fake_bd, invocations, with_bd};
use serial_test::serial;

#[test]
fn inbox_accepts_issue_shaped_json() {
    let json = r#"[{
        "id": "hq-42",
        "title": "LIFECYCLE: gastown/monitor requesting cycle",
        "description": "{\"action\":\"cycle\"}",
        "sender": "gastown/monitor",
        "status": "open",
        "priority": 2
    }]"#;
    let messages = parse_inbox(json.as_bytes()).unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].subject, "LIFECYCLE: gastown/monitor requesting cycle");
    assert_eq!(messages[0].sender, "gastown/monitor");
    assert!(!messages[0].is_closed());
}

#[test]
fn empty_inbox_output() {
    assert!(parse_inbox(b"").unwrap().is_empty());
    assert!(parse_inbox(b"[]\n").unwrap().is_empty());
}

#[test]
fn garbage_inbox_is_parse_error() {
    assert!(matches!(parse_inbox(b"{oops"), Err(MailError::Parse(_))));
}

#[tokio::test]
#[serial(bd)]
async fn inbox_queries_identity() {
    let dir = tempfile::tempdir().unwrap();
    let script = fake_bd(dir.path(), "[]", "", 0);
    let mailbox = BdMailbox::new(dir.path());

    let messages = with_bd(&script, || async { mailbox.inbox("relay/").await })
        .await
        .unwrap();

    assert!(messages.is_empty());
    assert_eq!(
        invocations(dir.path()),
        vec!["--no-daemon mail inbox --identity relay/ --json"]
    );
}

#[tokio::test]
#[serial(bd)]
async fn send_passes_subject_and_body() {
    let dir = tempfile::tempdir().unwrap();
    let script = fake_bd(dir.path(), "sent", "", 0);
    let mailbox = BdMailbox::new(dir.path());

    with_bd(&script, || async {
        mailbox
            .send("gastown/monitor", "GUPP_VIOLATION: nux", "stuck")
            .await
    })
    .await
    .unwrap();

    assert_eq!(
        invocations(dir.path()),
        vec!["--no-daemon mail send gastown/monitor --identity warden/ -s GUPP_VIOLATION: nux -m stuck"]
    );
}

#[tokio::test]
#[serial(bd)]
async fn deleting_missing_message_fails() {
    let dir = tempfile::tempdir().unwrap();
    let script = fake_bd(dir.path(), "", "message not found", 1);
    let mailbox = BdMailbox::new(dir.path());

    let result = with_bd(&script, || async { mailbox.delete("hq-1").await }).await;

    assert!(matches!(result, Err(MailError::CommandFailed(_))));
}
