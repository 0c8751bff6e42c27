// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
}

#[yare::parameterized(
    unset     = { None,                          true },
    spawning  = { Some(AgentState::Spawning),    true },
    working   = { Some(AgentState::Working),     true },
    done      = { Some(AgentState::Done),        false },
    dead      = { Some(AgentState::Dead),        false },
    stuck     = { Some(AgentState::Stuck),       false },
    gate      = { Some(AgentState::AwaitingGate), false },
    unknown   = { Some(AgentState::Unknown),     false },
)]
fn active_states(state: Option<AgentState>, expected: bool) {
    assert_eq!(AgentState::is_active(state), expected);
}

#[test]
fn unknown_state_strings_deserialize() {
    let state: AgentState = serde_json::from_str("\"hibernating\"").unwrap();
    assert_eq!(state, AgentState::Unknown);
    let state: AgentState = serde_json::from_str("\"awaiting-gate\"").unwrap();
    assert_eq!(state, AgentState::AwaitingGate);
}

#[test]
fn persistable_state_maps_onto_agent_state() {
    assert_eq!(AgentState::from(PersistableState::Stuck), AgentState::Stuck);
    assert_eq!(PersistableState::AwaitingGate.to_string(), "awaiting-gate");
}

#[test]
fn empty_hook_is_ignored() {
    let record = AgentRecord::new(AgentIdentity::worker("gastown", "nux"), at()).with_hook("  ");
    assert_eq!(record.hook(), None);
    let record = record.with_hook("gt-123");
    assert_eq!(record.hook(), Some("gt-123"));
}

#[test]
fn record_json_has_no_liveness_field() {
    let record = AgentRecord::new(AgentIdentity::monitor("gastown"), at())
        .with_state(AgentState::Working);
    let json = serde_json::to_value(&record).unwrap();
    let obj = json.as_object().unwrap();
    assert!(!obj.contains_key("alive"));
    assert!(!obj.contains_key("running"));
    assert_eq!(obj["identity"], "gastown-monitor");
    assert_eq!(obj["state"], "working");
    assert_eq!(record.id(), "wd-gastown-monitor");
}
