// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden-core: domain types for the warden agent supervisor

pub mod agent_record;
pub mod clock;
pub mod identity;
pub mod lifecycle;
pub mod message;
pub mod project;
pub mod role;
pub mod time_fmt;

pub use agent_record::{AgentRecord, AgentState, PersistableState};
pub use clock::{Clock, FakeClock, SystemClock};
pub use identity::{is_valid_agent_name, AgentIdentity, IdentityError, RoleType};
pub use lifecycle::{
    LifecycleAction, LifecycleRequest, RequestParseError, LIFECYCLE_MARKER, MAX_REQUEST_AGE,
};
pub use message::Message;
pub use project::{load_registry, ProjectError, ProjectSettings, ProjectStatus};
pub use role::{ResolvedRole, RoleConfig, RoleError, RoleResolver, RolesFile};
pub use time_fmt::{format_age, format_signed_age};
