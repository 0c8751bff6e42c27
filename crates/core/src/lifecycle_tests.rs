// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

#[test]
fn json_body_wins() {
    let msg = Message::new("hq-1", "LIFECYCLE: please")
        .with_body(r#"{"action":"cycle","from":"gastown/monitor"}"#)
        .with_sender("someone-else");
    let req = LifecycleRequest::from_message(&msg, now()).unwrap();
    assert_eq!(req.action, LifecycleAction::Cycle);
    assert_eq!(req.from, AgentIdentity::monitor("gastown"));
    assert_eq!(req.timestamp, now());
}

#[test]
fn json_body_without_from_uses_subject_then_sender() {
    let msg = Message::new("hq-1", "lifecycle: gastown-merger requesting restart")
        .with_body(r#"{"action":"restart"}"#)
        .with_sender("coordinator/");
    let req = LifecycleRequest::from_message(&msg, now()).unwrap();
    assert_eq!(req.from, AgentIdentity::merger("gastown"));

    let msg = Message::new("hq-2", "LIFECYCLE:")
        .with_body(r#"{"action":"shutdown"}"#)
        .with_sender("gastown/crew/max");
    let req = LifecycleRequest::from_message(&msg, now()).unwrap();
    assert_eq!(req.from, AgentIdentity::crew("gastown", "max"));
    assert_eq!(req.action, LifecycleAction::Shutdown);
}

#[yare::parameterized(
    cycle     = { "LIFECYCLE: gastown-monitor requesting cycle",    LifecycleAction::Cycle },
    cycling   = { "LIFECYCLE: gastown-monitor requesting cycling",  LifecycleAction::Cycle },
    restart   = { "Lifecycle: gastown-monitor requesting restart",  LifecycleAction::Restart },
    shutdown  = { "LIFECYCLE: gastown-monitor requesting shutdown", LifecycleAction::Shutdown },
    stop      = { "lifecycle: gastown-monitor requesting stop",     LifecycleAction::Shutdown },
)]
fn legacy_subject(subject: &str, action: LifecycleAction) {
    let msg = Message::new("hq-1", subject).with_body("handing off, see notes");
    let req = LifecycleRequest::from_message(&msg, now()).unwrap();
    assert_eq!(req.action, action);
    assert_eq!(req.from, AgentIdentity::monitor("gastown"));
}

#[test]
fn legacy_subject_sender_does_not_supply_the_action() {
    // Words before "requesting" belong to the sender.
    let msg = Message::new("hq-1", "LIFECYCLE: stop-merger requesting restart");
    let req = LifecycleRequest::from_message(&msg, now()).unwrap();
    assert_eq!(req.action, LifecycleAction::Restart);
    assert_eq!(req.from, AgentIdentity::merger("stop"));
}

#[test]
fn non_lifecycle_subject_is_rejected() {
    let msg = Message::new("hq-1", "WORKER_STARTED: gastown/nux");
    assert!(!LifecycleRequest::is_lifecycle_message(&msg));
    assert_eq!(
        LifecycleRequest::from_message(&msg, now()),
        Err(RequestParseError::NotLifecycle)
    );
}

#[test]
fn unknown_json_action_is_an_error() {
    let msg = Message::new("hq-1", "LIFECYCLE: x")
        .with_body(r#"{"action":"explode","from":"relay"}"#);
    assert!(matches!(
        LifecycleRequest::from_message(&msg, now()),
        Err(RequestParseError::UnknownAction(_))
    ));
}

#[test]
fn missing_action_is_an_error() {
    let msg = Message::new("hq-1", "LIFECYCLE: gastown-monitor requesting attention");
    assert_eq!(
        LifecycleRequest::from_message(&msg, now()),
        Err(RequestParseError::MissingAction)
    );
}

#[test]
fn missing_sender_is_an_error() {
    let msg = Message::new("hq-1", "LIFECYCLE: cycle please");
    assert_eq!(
        LifecycleRequest::from_message(&msg, now()),
        Err(RequestParseError::MissingSender)
    );
}

#[test]
fn unparseable_sender_is_an_error() {
    let msg = Message::new("hq-1", "LIFECYCLE: overseer requesting cycle");
    assert!(matches!(
        LifecycleRequest::from_message(&msg, now()),
        Err(RequestParseError::InvalidSender(_))
    ));
}

#[test]
fn staleness_uses_message_timestamp() {
    let sent = now() - chrono::Duration::hours(7);
    let msg = Message::new("hq-1", "LIFECYCLE: relay requesting cycle").sent_at(sent);
    let req = LifecycleRequest::from_message(&msg, now()).unwrap();
    assert_eq!(req.timestamp, sent);
    assert!(req.is_stale(now()));
    assert!(!req.is_stale(sent + chrono::Duration::hours(5)));
}

#[test]
fn future_timestamps_are_not_stale() {
    let msg = Message::new("hq-1", "LIFECYCLE: relay requesting cycle")
        .sent_at(now() + chrono::Duration::minutes(5));
    let req = LifecycleRequest::from_message(&msg, now()).unwrap();
    assert!(!req.is_stale(now()));
}

#[test]
fn subject_and_body_helpers_parse_back() {
    let from = AgentIdentity::worker("gastown", "nux");
    let msg = Message::new("hq-1", LifecycleRequest::subject(&from, LifecycleAction::Cycle))
        .with_body(LifecycleRequest::body(&from, LifecycleAction::Cycle));
    let req = LifecycleRequest::from_message(&msg, now()).unwrap();
    assert_eq!(req.from, from);
    assert_eq!(req.action, LifecycleAction::Cycle);
}
