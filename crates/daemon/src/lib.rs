// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Warden supervisor library
//!
//! The `wardend` binary is a thin shell around this crate: process control
//! and the state record live in [`lifecycle`], the recovery loop in
//! [`supervisor`].

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod env;
pub mod lifecycle;
pub mod supervisor;

#[cfg(test)]
mod test_helpers;

pub use config::{Config, ConfigError};
pub use lifecycle::{Daemon, DaemonState, LifecycleError};
pub use supervisor::{
    run_loop, ControlSignal, Supervisor, SupervisorConfig, SupervisorDeps, TriageStatus,
    HEARTBEAT_INTERVAL,
};
