// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::lifecycle::control::{is_running, poke, process_alive, read_pid, stop};
use std::time::Duration;

/// Pid of a process that has already exited and been reaped
fn dead_pid() -> u32 {
    let mut child = std::process::Command::new("true").spawn().unwrap();
    let pid = child.id();
    child.wait().unwrap();
    pid
}

#[test]
fn read_pid_parses_trimmed_number() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("daemon.pid");
    std::fs::write(&path, "4242\n").unwrap();

    assert_eq!(read_pid(&path), Some(4242));
}

#[yare::parameterized(
    missing = { None },
    garbage = { Some("not-a-pid") },
    zero    = { Some("0") },
    too_big = { Some("4294967295") },
)]
fn read_pid_rejects(content: Option<&str>) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("daemon.pid");
    if let Some(content) = content {
        std::fs::write(&path, content).unwrap();
    }

    assert_eq!(read_pid(&path), None);
}

#[test]
fn own_process_is_alive() {
    assert!(process_alive(std::process::id()));
}

#[test]
fn is_running_reports_live_pid() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let daemon = startup(&config).unwrap();

    assert_eq!(is_running(&config), Some(std::process::id()));
    drop(daemon);
}

#[test]
fn is_running_removes_stale_pid_file() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.state_dir).unwrap();
    std::fs::write(&config.pid_path, dead_pid().to_string()).unwrap();

    assert_eq!(is_running(&config), None);
    assert!(!config.pid_path.exists(), "stale pid file should be removed");
}

#[tokio::test]
async fn stop_without_supervisor_is_noop() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    assert!(!stop(&config, Duration::from_millis(10)).await.unwrap());
    assert!(!poke(&config).unwrap());
}

#[tokio::test]
async fn stop_terminates_process_and_removes_pid_file() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.state_dir).unwrap();

    let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
    std::fs::write(&config.pid_path, child.id().to_string()).unwrap();

    let stopped = stop(&config, Duration::from_millis(300)).await.unwrap();

    assert!(stopped);
    let status = child.wait().unwrap();
    assert!(!status.success(), "sleep should have been signalled");
    assert!(!config.pid_path.exists());
}
