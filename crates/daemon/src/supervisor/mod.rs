// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The recovery loop.
//!
//! Each heartbeat discovers the state of every agent from tmux and the work
//! ledger, restarts what is dead, reports what is stuck, and executes the
//! lifecycle requests agents have mailed in. Nothing learned in one tick is
//! trusted in the next.

mod backoff;
mod detectors;
mod discovery;
mod requests;
mod spawns;
mod start;
mod triage;
mod watchdog;

pub use backoff::Backoff;
pub use detectors::GUPP_TIMEOUT;
pub use discovery::Liveness;
pub use spawns::{PendingSpawn, SPAWN_MAX_AGE, WORKER_STARTED_MARKER};
pub use start::{StartError, StartMode, StartOutcome};
pub use triage::TriageStatus;
pub use watchdog::{RelayHeartbeat, HEARTBEAT_KILL_AFTER, HEARTBEAT_STALE_AFTER};

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use warden_adapters::{Mailbox, SessionAdapter, WorkLedger, WorkspaceSync};
use warden_core::{load_registry, Clock, RoleResolver};

use crate::config::Config;
use crate::lifecycle::Daemon;

/// Fixed heartbeat interval. A safety net: agents and SIGUSR1 are the
/// primary wake mechanism.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(3 * 60);

/// Out-of-band control for [`run_loop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Drain lifecycle requests without waiting for the next tick
    ProcessNow,
    Shutdown,
}

/// Supervisor path and mode configuration
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Deployment root (project registry and settings live here)
    pub root: PathBuf,
    /// Where mechanical triage records its outcome
    pub triage_path: PathBuf,
    /// Heartbeat file written by the relay
    pub heartbeat_path: PathBuf,
    /// Mechanical triage only, even when tmux is reachable
    pub degraded: bool,
}

impl SupervisorConfig {
    pub fn from_config(config: &Config, degraded: bool) -> Self {
        Self {
            root: config.root.clone(),
            triage_path: config.triage_path.clone(),
            heartbeat_path: config.heartbeat_path.clone(),
            degraded,
        }
    }
}

/// Supervisor adapter dependencies
pub struct SupervisorDeps<S, L, M, W> {
    pub sessions: S,
    pub ledger: L,
    pub mail: M,
    pub sync: W,
    pub roles: RoleResolver,
}

/// Supervisor that keeps agents alive
pub struct Supervisor<S, L, M, W, C: Clock> {
    pub(crate) sessions: S,
    pub(crate) ledger: L,
    pub(crate) mail: M,
    pub(crate) sync: W,
    pub(crate) roles: RoleResolver,
    pub(crate) clock: C,
    pub(crate) config: SupervisorConfig,
    pub(crate) backoff: Backoff,
}

impl<S, L, M, W, C> Supervisor<S, L, M, W, C>
where
    S: SessionAdapter,
    L: WorkLedger,
    M: Mailbox,
    W: WorkspaceSync,
    C: Clock,
{
    pub fn new(deps: SupervisorDeps<S, L, M, W>, clock: C, config: SupervisorConfig) -> Self {
        Self {
            sessions: deps.sessions,
            ledger: deps.ledger,
            mail: deps.mail,
            sync: deps.sync,
            roles: deps.roles,
            clock,
            config,
            backoff: Backoff::default(),
        }
    }

    /// Get a reference to the clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// One heartbeat. Restarts happen before violation scans; a failure for
    /// one agent never stops the rest of the tick.
    pub async fn tick(&mut self) {
        info!("heartbeat starting");

        // 1. Relay triage (fresh each tick)
        self.ensure_watchdog_running().await;

        // 2. Direct relay liveness check, in case triage itself is wedged
        self.check_relay_heartbeat().await;

        // 3-4. Per-project agents
        let projects = self.projects();
        self.ensure_monitors_running(&projects).await;
        self.ensure_mergers_running(&projects).await;

        // 5. Workers announced by their spawners
        self.trigger_pending_spawns().await;

        // 6. Agent-initiated cycle/restart/shutdown
        self.process_lifecycle_requests().await;

        // 7-9. Violation scans
        self.scan_gupp_violations().await;
        self.scan_orphaned_work().await;
        self.scan_crashed_workers().await;
    }

    /// Known projects; an unreadable registry means none this tick.
    pub(crate) fn projects(&self) -> Vec<String> {
        match load_registry(&self.config.root) {
            Ok(projects) => projects,
            Err(e) => {
                warn!(error = %e, "failed to load project registry");
                Vec::new()
            }
        }
    }
}

/// Std duration as a chrono duration for comparing ledger timestamps
pub(crate) fn as_signed(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero())
}

/// Drive the supervisor until shutdown.
///
/// The first tick runs immediately. Control signals take priority over the
/// timer so a shutdown is never stuck behind a tick that is due.
pub async fn run_loop<S, L, M, W, C>(
    supervisor: &mut Supervisor<S, L, M, W, C>,
    daemon: &mut Daemon,
    mut control: mpsc::Receiver<ControlSignal>,
    interval: Duration,
) where
    S: SessionAdapter,
    L: WorkLedger,
    M: Mailbox,
    W: WorkspaceSync,
    C: Clock,
{
    // NOTE: Must be created outside the loop - select! re-evaluates
    // branches on each iteration, so a sleep() inside would restart on
    // every signal and the heartbeat would never fire under load.
    let mut heartbeat = tokio::time::interval(interval);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            signal = control.recv() => match signal {
                Some(ControlSignal::ProcessNow) => {
                    info!("process-now signal, draining lifecycle requests");
                    supervisor.process_lifecycle_requests().await;
                }
                Some(ControlSignal::Shutdown) => {
                    info!("shutdown requested");
                    break;
                }
                None => {
                    info!("control channel closed, shutting down");
                    break;
                }
            },

            _ = heartbeat.tick() => {
                supervisor.tick().await;
                daemon.record_heartbeat(supervisor.clock().utc_now());
            }
        }
    }
}

#[cfg(test)]
#[path = "../supervisor_tests/mod.rs"]
mod tests;
