// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn startup_writes_pid_and_state() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let daemon = startup(&config).unwrap();

    let pid = std::fs::read_to_string(&config.pid_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());

    let state = DaemonState::load(&config.state_path).unwrap().unwrap();
    assert!(state.running);
    assert_eq!(state.pid, std::process::id());
    assert!(state.started_at.is_some());
    assert_eq!(state.heartbeat_count, 0);
    assert_eq!(daemon.state, state);
}

#[test]
fn startup_lock_failed_does_not_write_pid_or_remove_files() {
    // Simulate a running supervisor by holding the lock.
    // A second startup attempt must fail without touching its files.
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.state_dir).unwrap();

    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)
        .unwrap();
    lock_file.lock_exclusive().unwrap();

    match startup(&config) {
        Err(LifecycleError::LockFailed(_)) => {} // expected
        Err(e) => panic!("expected LockFailed, got: {e}"),
        Ok(_) => panic!("expected LockFailed, but startup succeeded"),
    }

    assert!(
        !config.pid_path.exists(),
        "pid file must not be written without the lock"
    );
    assert!(config.lock_path.exists(), "lock file must not be deleted");
}

#[test]
fn startup_lock_failed_keeps_running_supervisors_pid() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let first = startup(&config).unwrap();
    let before = std::fs::read_to_string(&config.pid_path).unwrap();

    assert!(matches!(
        startup(&config),
        Err(LifecycleError::LockFailed(_))
    ));
    assert_eq!(std::fs::read_to_string(&config.pid_path).unwrap(), before);

    drop(first);
}

#[test]
fn lock_released_after_shutdown() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let first = startup(&config).unwrap();
    first.shutdown().unwrap();

    let second = startup(&config);
    assert!(second.is_ok(), "lock should be free after shutdown");
}

#[test]
fn shutdown_flushes_state_and_removes_pid() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let mut daemon = startup(&config).unwrap();
    daemon.record_heartbeat(Utc::now());
    daemon.shutdown().unwrap();

    assert!(!config.pid_path.exists(), "pid file should be removed");
    let state = DaemonState::load(&config.state_path).unwrap().unwrap();
    assert!(!state.running);
    assert_eq!(state.heartbeat_count, 1);
}

#[test]
fn record_heartbeat_persists_count() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let mut daemon = startup(&config).unwrap();
    let at = Utc::now();

    daemon.record_heartbeat(at);
    daemon.record_heartbeat(at);

    let state = DaemonState::load(&config.state_path).unwrap().unwrap();
    assert_eq!(state.heartbeat_count, 2);
    assert_eq!(state.last_heartbeat, Some(at));
}

#[test]
fn state_save_leaves_no_temp_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    DaemonState::default().save(&path).unwrap();

    assert!(path.exists());
    assert!(!dir.path().join("state.json.tmp").exists());
}

#[test]
fn state_load_missing_is_none() {
    let dir = tempdir().unwrap();
    assert_eq!(DaemonState::load(&dir.path().join("state.json")).unwrap(), None);
}

#[test]
fn state_load_garbage_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        DaemonState::load(&path),
        Err(LifecycleError::State(_, _))
    ));
}

#[test]
fn cleanup_on_failure_removes_pid_file() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.state_dir).unwrap();
    std::fs::write(&config.pid_path, b"12345").unwrap();

    cleanup_on_failure(&config);

    assert!(!config.pid_path.exists());
}
