// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::bd::script::{fake_bd, invocations, with_bd};
use serial_test::serial;
use yare::parameterized;

const SHOW_OUTPUT: &str = r#"[{
    "id": "wd-gastown-worker-nux",
    "title": "nux",
    "agent_state": "working",
    "hook_bead": "gt-123",
    "role_bead": "wd-role-worker",
    "updated_at": "2026-01-15T10:00:00Z"
}]"#;

#[test]
fn issue_converts_to_record() {
    let issue = parse_issues(SHOW_OUTPUT.as_bytes()).unwrap().remove(0);
    let record = issue.into_record().unwrap();

    assert_eq!(record.identity, AgentIdentity::worker("gastown", "nux"));
    assert_eq!(record.state, Some(AgentState::Working));
    assert_eq!(record.hook(), Some("gt-123"));
    assert_eq!(record.role_bead.as_deref(), Some("wd-role-worker"));
}

#[test]
fn empty_slots_become_none() {
    let json = r#"[{"id":"wd-relay","agent_state":"","hook_bead":"","updated_at":"2026-01-15T10:00:00Z"}]"#;
    let record = parse_issues(json.as_bytes())
        .unwrap()
        .remove(0)
        .into_record()
        .unwrap();
    assert_eq!(record.state, None);
    assert_eq!(record.hook_bead, None);
}

#[test]
fn falls_back_to_created_at() {
    let json = r#"[{"id":"wd-relay","created_at":"2026-01-15T09:00:00Z"}]"#;
    let record = parse_issues(json.as_bytes())
        .unwrap()
        .remove(0)
        .into_record()
        .unwrap();
    assert_eq!(record.updated_at.to_rfc3339(), "2026-01-15T09:00:00+00:00");
}

#[test]
fn record_without_timestamp_is_skipped() {
    let json = r#"[{"id":"wd-relay"}]"#;
    let issue = parse_issues(json.as_bytes()).unwrap().remove(0);
    assert!(issue.into_record().is_none());
}

#[test]
fn non_agent_id_is_skipped() {
    let json = r#"[{"id":"gt-123","updated_at":"2026-01-15T10:00:00Z"}]"#;
    let issue = parse_issues(json.as_bytes()).unwrap().remove(0);
    assert!(issue.into_record().is_none());
}

#[parameterized(
    working = { "working", AgentState::Working },
    upper = { "DEAD", AgentState::Dead },
    gate = { "awaiting-gate", AgentState::AwaitingGate },
    novel = { "hibernating", AgentState::Unknown },
)]
fn state_strings(raw: &str, expected: AgentState) {
    assert_eq!(parse_state(raw), expected);
}

#[test]
fn garbage_output_is_parse_error() {
    assert!(matches!(
        parse_issues(b"not json"),
        Err(LedgerError::Parse(_))
    ));
}

#[tokio::test]
#[serial(bd)]
async fn show_runs_bd_with_record_id() {
    let dir = tempfile::tempdir().unwrap();
    let script = fake_bd(dir.path(), SHOW_OUTPUT, "", 0);
    let ledger = BdLedger::new(dir.path());

    let record = with_bd(&script, || async {
        ledger
            .agent_record(&AgentIdentity::worker("gastown", "nux"))
            .await
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(record.hook(), Some("gt-123"));
    assert_eq!(
        invocations(dir.path()),
        vec!["--no-daemon show wd-gastown-worker-nux --json"]
    );
}

#[tokio::test]
#[serial(bd)]
async fn show_missing_record_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let script = fake_bd(dir.path(), "", "Error: issue not found", 1);
    let ledger = BdLedger::new(dir.path());

    let record = with_bd(&script, || async {
        ledger.agent_record(&AgentIdentity::relay()).await
    })
    .await
    .unwrap();

    assert!(record.is_none());
}

#[tokio::test]
#[serial(bd)]
async fn list_filters_by_role() {
    let dir = tempfile::tempdir().unwrap();
    let json = r#"[
        {"id":"wd-gastown-worker-nux","updated_at":"2026-01-15T10:00:00Z"},
        {"id":"wd-gastown-monitor","updated_at":"2026-01-15T10:00:00Z"},
        {"id":"wd-relay","updated_at":"2026-01-15T10:00:00Z"}
    ]"#;
    let script = fake_bd(dir.path(), json, "", 0);
    let ledger = BdLedger::new(dir.path());

    let (workers, all) = with_bd(&script, || async {
        (
            ledger.list_agent_records(Some(RoleType::Worker)).await,
            ledger.list_agent_records(None).await,
        )
    })
    .await;

    let workers = workers.unwrap();
    assert_eq!(workers.len(), 1);
    assert_eq!(workers[0].identity, AgentIdentity::worker("gastown", "nux"));
    assert_eq!(all.unwrap().len(), 3);
    assert_eq!(
        invocations(dir.path())[0],
        "--no-daemon list --json --label=warden:agent"
    );
}

#[tokio::test]
#[serial(bd)]
async fn set_state_writes_persistable_state() {
    let dir = tempfile::tempdir().unwrap();
    let script = fake_bd(dir.path(), "ok", "", 0);
    let ledger = BdLedger::new(dir.path());

    with_bd(&script, || async {
        ledger
            .set_agent_state(
                &AgentIdentity::worker("gastown", "nux"),
                PersistableState::Stuck,
            )
            .await
    })
    .await
    .unwrap();

    assert_eq!(
        invocations(dir.path()),
        vec!["--no-daemon agent state wd-gastown-worker-nux stuck"]
    );
}

#[tokio::test]
#[serial(bd)]
async fn failing_command_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let script = fake_bd(dir.path(), "", "database locked", 2);
    let ledger = BdLedger::new(dir.path());

    let result = with_bd(&script, || async { ledger.list_agent_records(None).await }).await;

    assert!(matches!(result, Err(LedgerError::CommandFailed(ref m)) if m.contains("database locked")));
}
