// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

#[yare::parameterized(
    coordinator         = { "coordinator",          RoleType::Coordinator, "",          "" },
    mayor               = { "mayor",                RoleType::Coordinator, "",          "" },
    relay               = { "relay",                RoleType::Relay,       "",          "" },
    relay_address       = { "relay/",               RoleType::Relay,       "",          "" },
    deacon              = { "deacon",               RoleType::Relay,       "",          "" },
    boot                = { "boot",                 RoleType::Triage,      "",          "" },
    monitor             = { "gastown-monitor",      RoleType::Monitor,     "gastown",   "" },
    witness             = { "gastown-witness",      RoleType::Monitor,     "gastown",   "" },
    monitor_address     = { "gastown/monitor",      RoleType::Monitor,     "gastown",   "" },
    refinery            = { "gastown-refinery",     RoleType::Merger,      "gastown",   "" },
    merger_address      = { "gastown/merger",       RoleType::Merger,      "gastown",   "" },
    hyphenated_project  = { "my-app-merger",        RoleType::Merger,      "my-app",    "" },
    crew                = { "gastown-crew-max",     RoleType::Crew,        "gastown",   "max" },
    crew_address        = { "gastown/crew/max",     RoleType::Crew,        "gastown",   "max" },
    worker              = { "gastown-worker-toast", RoleType::Worker,      "gastown",   "toast" },
    polecat             = { "gastown-polecat-nux",  RoleType::Worker,      "gastown",   "nux" },
    workers_address     = { "gastown/workers/nux",  RoleType::Worker,      "gastown",   "nux" },
    polecats_address    = { "gastown/polecats/nux", RoleType::Worker,      "gastown",   "nux" },
    hyphenated_worker   = { "my-app-worker-toast",  RoleType::Worker,      "my-app",    "toast" },
    surrounding_space   = { "  gastown-monitor \n", RoleType::Monitor,     "gastown",   "" },
    upper_case_keyword  = { "Gastown-WITNESS",      RoleType::Monitor,     "Gastown",   "" },
    crew_word_project   = { "my-crew-app-worker-nux", RoleType::Worker,    "my-crew-app", "nux" },
    worker_word_project = { "a-worker-b-crew-max",  RoleType::Crew,        "a-worker-b", "max" },
    crew_word_monitor   = { "my-crew-app-monitor",  RoleType::Monitor,     "my-crew-app", "" },
    worker_word_merger  = { "gastown-worker-merger", RoleType::Merger,     "gastown-worker", "" },
    repeated_marker     = { "ops-crew-crew-max",    RoleType::Crew,        "ops-crew",  "max" },
)]
fn parse_accepted_forms(input: &str, role: RoleType, project: &str, name: &str) {
    let id = AgentIdentity::parse(input).unwrap();
    assert_eq!(id.role, role);
    assert_eq!(id.project, project);
    assert_eq!(id.name, name);
}

#[yare::parameterized(
    empty             = { "" },
    only_slash        = { "/" },
    unknown_word      = { "overseer" },
    bare_suffix       = { "monitor-" },
    missing_project   = { "-crew-max" },
    missing_name      = { "gastown-worker-" },
    unknown_sub_role  = { "gastown/janitor" },
    too_many_parts    = { "a/b/c/d" },
    empty_address_name = { "gastown/workers/" },
    reserved_in_address = { "gastown/workers/nux-monitor" },
    reserved_address_name = { "gastown/crew/merger" },
)]
fn parse_rejects(input: &str) {
    assert!(AgentIdentity::parse(input).is_err(), "accepted {:?}", input);
}

#[test]
fn parse_empty_is_distinct_error() {
    assert_eq!(AgentIdentity::parse("   "), Err(IdentityError::Empty));
}

#[test]
fn missing_name_reports_input() {
    let err = AgentIdentity::parse("gastown-worker-").unwrap_err();
    assert!(matches!(err, IdentityError::MissingName(ref s) if s == "gastown-worker-"));
}

#[test]
fn reserved_name_in_address_is_distinct_error() {
    assert_eq!(
        AgentIdentity::parse("gastown/workers/nux-monitor"),
        Err(IdentityError::ReservedName("nux-monitor".to_string()))
    );
}

#[yare::parameterized(
    plain       = { "nux",          true },
    hyphenated  = { "nux-two",      true },
    plural_word = { "workers-b",    true },
    empty       = { "",             false },
    whole_word  = { "monitor",      false },
    trailing    = { "nux-merger",   false },
    inner       = { "a-crew-b",     false },
    legacy_word = { "Polecat",      false },
)]
fn agent_name_validity(name: &str, valid: bool) {
    assert_eq!(is_valid_agent_name(name), valid);
}

#[yare::parameterized(
    relay   = { AgentIdentity::relay(),                   "relay",               "relay/" },
    monitor = { AgentIdentity::monitor("gastown"),        "gastown-monitor",     "gastown/monitor" },
    merger  = { AgentIdentity::merger("gastown"),         "gastown-merger",      "gastown/merger" },
    crew    = { AgentIdentity::crew("gastown", "max"),    "gastown-crew-max",    "gastown/crew/max" },
    worker  = { AgentIdentity::worker("gastown", "nux"),  "gastown-worker-nux",  "gastown/workers/nux" },
)]
fn renders_flat_and_address(id: AgentIdentity, flat: &str, address: &str) {
    assert_eq!(id.flat(), flat);
    assert_eq!(id.to_string(), flat);
    assert_eq!(id.address(), address);
    assert_eq!(AgentIdentity::parse(&id.address()).unwrap(), id);
}

#[test]
fn record_id_is_prefixed_flat_form() {
    let id = AgentIdentity::worker("gastown", "nux");
    assert_eq!(id.record_id(), "wd-gastown-worker-nux");
    assert_eq!(AgentIdentity::from_record_id("wd-gastown-worker-nux").unwrap(), id);
}

#[test]
fn from_record_id_requires_prefix() {
    assert!(AgentIdentity::from_record_id("gastown-worker-nux").is_err());
}

#[test]
fn monitor_address_for_project_agents() {
    assert_eq!(
        AgentIdentity::worker("gastown", "nux").monitor_address(),
        "gastown/monitor"
    );
    assert_eq!(
        AgentIdentity::merger("beads").monitor_address(),
        "beads/monitor"
    );
}

#[test]
fn monitor_address_for_global_agents_is_relay() {
    assert_eq!(AgentIdentity::coordinator().monitor_address(), "relay/");
}

#[test]
fn serde_uses_flat_string() {
    let id = AgentIdentity::crew("gastown", "max");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"gastown-crew-max\"");
    let back: AgentIdentity = serde_json::from_str("\"gastown/crew/max\"").unwrap();
    assert_eq!(back, id);
}

#[test]
fn legacy_keys_differ_for_renamed_roles() {
    for role in RoleType::ALL {
        if role == RoleType::Crew {
            assert_eq!(role.key(), role.legacy_key());
        } else {
            assert_ne!(role.key(), role.legacy_key());
        }
    }
}

fn project_name() -> impl Strategy<Value = String> {
    let segment = prop_oneof![
        Just("crew".to_string()),
        Just("worker".to_string()),
        Just("polecat".to_string()),
        Just("monitor".to_string()),
        Just("merger".to_string()),
        "[a-z][a-z0-9]{0,5}",
    ];
    prop_oneof![
        "[a-z][a-z0-9-]{0,16}",
        prop::collection::vec(segment, 1..4).prop_map(|segments| segments.join("-")),
    ]
}

proptest! {
    #[test]
    fn parse_never_panics(input in "\\PC*") {
        let _ = AgentIdentity::parse(&input);
    }

    #[test]
    fn named_identities_survive_flat_rendering(
        project in project_name(),
        name in "[a-z][a-z0-9-]{0,12}",
        crew in any::<bool>(),
    ) {
        prop_assume!(is_valid_agent_name(&name));
        let id = if crew {
            AgentIdentity::crew(project, name)
        } else {
            AgentIdentity::worker(project, name)
        };
        prop_assert_eq!(AgentIdentity::parse(&id.flat()).unwrap(), id.clone());
        prop_assert_eq!(AgentIdentity::from_record_id(&id.record_id()).unwrap(), id);
    }

    #[test]
    fn project_singletons_survive_flat_rendering(
        project in project_name(),
        merger in any::<bool>(),
    ) {
        let id = if merger {
            AgentIdentity::merger(project)
        } else {
            AgentIdentity::monitor(project)
        };
        prop_assert_eq!(AgentIdentity::parse(&id.flat()).unwrap(), id);
    }
}
