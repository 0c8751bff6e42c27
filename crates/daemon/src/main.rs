// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Warden Daemon (wardend)
//!
//! Keeps agent sessions alive: a heartbeat loop that rediscovers every
//! agent from tmux and the work ledger, restarts what died, and reports
//! what is stuck.
//!
//! Architecture:
//! - Signal Task: maps SIGINT/SIGTERM/SIGUSR1 onto control signals
//! - Supervisor Loop: main task, one heartbeat at a time

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::Path;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{error, info};
use warden_adapters::{BdLedger, BdMailbox, GitWorkspaceSync, TmuxAdapter, TracedSession};
use warden_core::SystemClock;
use warden_daemon::lifecycle::{self, control};
use warden_daemon::{
    env, run_loop, Config, ControlSignal, DaemonState, LifecycleError, Supervisor,
    SupervisorConfig, SupervisorDeps, TriageStatus, HEARTBEAT_INTERVAL,
};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH"));

/// How long `wardend stop` waits after SIGTERM before SIGKILL
const STOP_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags and control commands before any lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("wardend {VERSION}");
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            "status" => return status(&Config::load()?),
            "stop" => {
                let config = Config::load()?;
                if control::stop(&config, STOP_GRACE).await? {
                    println!("wardend stopped");
                } else {
                    println!("wardend is not running");
                }
                return Ok(());
            }
            "poke" => {
                if control::poke(&Config::load()?)? {
                    println!("wardend poked");
                } else {
                    println!("wardend is not running");
                }
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: wardend [status | stop | poke | --help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    rotate_log_if_needed(&config.log_path);

    // Write startup marker to log (before tracing setup, so it is never
    // interleaved with buffered output)
    write_startup_marker(&config)?;

    let log_guard = setup_logging(&config)?;

    info!(root = %config.root.display(), version = VERSION, "starting supervisor");

    let mut daemon = match lifecycle::startup(&config) {
        Ok(daemon) => daemon,
        Err(LifecycleError::LockFailed(_)) => {
            eprintln!("wardend is already running");
            if let Some(pid) = control::read_pid(&config.pid_path) {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e.to_string());
            error!("failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let roles = match config.load_roles() {
        Ok(roles) => roles,
        Err(e) => {
            write_startup_error(&config, &e.to_string());
            error!("failed to load roles: {}", e);
            daemon.shutdown()?;
            drop(log_guard);
            return Err(e.into());
        }
    };

    let root = config.root.clone();
    let mut supervisor = Supervisor::new(
        SupervisorDeps {
            sessions: TracedSession::new(TmuxAdapter::new()),
            ledger: BdLedger::new(&root),
            mail: BdMailbox::new(&root),
            sync: GitWorkspaceSync::new(),
            roles,
        },
        SystemClock,
        SupervisorConfig::from_config(&config, env::degraded()),
    );

    let (control_tx, control_rx) = mpsc::channel(16);
    spawn_signal_task(control_tx)?;

    let interval = heartbeat_interval();
    info!(interval_secs = interval.as_secs(), "supervisor ready");

    run_loop(&mut supervisor, &mut daemon, control_rx, interval).await;

    daemon.shutdown()?;
    info!("daemon stopped");
    Ok(())
}

fn print_help() {
    println!("wardend {VERSION}");
    println!("Warden Daemon - keeps agent sessions alive and recovers crashed work");
    println!();
    println!("USAGE:");
    println!("    wardend [COMMAND]");
    println!();
    println!("With no command, runs the supervisor in the foreground.");
    println!();
    println!("COMMANDS:");
    println!("    status           Report whether a supervisor is running");
    println!("    stop             Stop the running supervisor");
    println!("    poke             Ask the running supervisor to process lifecycle requests now");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
}

fn status(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let Some(pid) = control::is_running(config) else {
        println!("wardend is not running");
        return Ok(());
    };
    println!("wardend is running");
    println!("  pid: {pid}");
    if let Some(state) = DaemonState::load(&config.state_path)? {
        if let Some(started) = state.started_at {
            println!("  started: {}", started.to_rfc3339());
        }
        if let Some(last) = state.last_heartbeat {
            println!("  last heartbeat: {}", last.to_rfc3339());
        }
        println!("  heartbeats: {}", state.heartbeat_count);
    }
    if let Some(triage) = TriageStatus::load(&config.triage_path) {
        match triage.target {
            Some(target) => println!("  last triage: {} {}", triage.last_action, target),
            None => println!("  last triage: {}", triage.last_action),
        }
    }
    Ok(())
}

/// Forward process signals to the supervisor loop.
fn spawn_signal_task(tx: mpsc::Sender<ControlSignal>) -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;

    tokio::spawn(async move {
        loop {
            let sig = tokio::select! {
                _ = sigterm.recv() => {
                    info!("received SIGTERM, shutting down");
                    ControlSignal::Shutdown
                }
                _ = sigint.recv() => {
                    info!("received SIGINT, shutting down");
                    ControlSignal::Shutdown
                }
                _ = sigusr1.recv() => ControlSignal::ProcessNow,
            };
            if tx.send(sig).await.is_err() || sig == ControlSignal::Shutdown {
                break;
            }
        }
    });
    Ok(())
}

/// Heartbeat interval, overridable for testing via `WARDEN_HEARTBEAT_SECS`
fn heartbeat_interval() -> Duration {
    env::heartbeat_secs().unwrap_or(HEARTBEAT_INTERVAL)
}

/// Rotate the log once it grows past this size
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Rotated logs kept (`daemon.log.1` is the newest)
const MAX_ROTATIONS: u32 = 3;

/// Rotate `daemon.log` to `daemon.log.1`, shifting older rotations up and
/// dropping the oldest. Best effort: failures leave the log in place.
fn rotate_log_if_needed(log_path: &Path) {
    let Ok(meta) = std::fs::metadata(log_path) else {
        return;
    };
    if meta.len() <= MAX_LOG_SIZE {
        return;
    }

    let rotated = |n: u32| {
        let mut name = log_path.as_os_str().to_owned();
        name.push(format!(".{n}"));
        std::path::PathBuf::from(name)
    };

    let _ = std::fs::remove_file(rotated(MAX_ROTATIONS));
    for n in (1..MAX_ROTATIONS).rev() {
        let from = rotated(n);
        if from.exists() {
            let _ = std::fs::rename(&from, rotated(n + 1));
        }
    }
    let _ = std::fs::rename(log_path, rotated(1));
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- wardend: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- wardend: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
fn write_startup_error(config: &Config, error: &str) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
