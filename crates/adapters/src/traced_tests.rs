// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::session::{FakeSessionAdapter, SessionCall};
use serial_test::{parallel, serial};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

/// Assert that captured logs contain the expected substring
fn assert_log(logs: &str, label: &str, expected: &str) {
    assert!(logs.contains(expected), "Should log {label}. Logs:\n{logs}",);
}

#[test]
#[serial(tracing)]
fn create_logs_entry_and_completion() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedSession::new(FakeSessionAdapter::new());
        traced.create("wd-gastown-monitor", Path::new("/tmp")).await
    });

    assert!(result.is_ok(), "create should succeed: {:?}", result);
    assert_log(&logs, "span name", "session.create");
    assert_log(&logs, "session name", "wd-gastown-monitor");
    assert_log(&logs, "entry message", "starting");
    assert_log(&logs, "completion", "session created");
    assert_log(&logs, "timing", "elapsed_ms");
}

#[test]
#[serial(tracing)]
fn create_logs_error_on_failure() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeSessionAdapter::new();
        fake.fail_create(Some("no server"));
        TracedSession::new(fake)
            .create("wd-relay", Path::new("/tmp"))
            .await
    });

    assert!(result.is_err());
    assert_log(&logs, "failure", "create failed");
}

#[test]
#[serial(tracing)]
fn kill_logs_operation() {
    let (logs, result) = with_tracing(|| async {
        TracedSession::new(FakeSessionAdapter::new())
            .kill("nonexistent")
            .await
    });

    assert!(result.is_ok());
    assert_log(&logs, "kill span", "session.kill");
    assert_log(&logs, "kill completion", "killed");
}

#[test]
#[serial(tracing)]
fn nudge_logs_span() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeSessionAdapter::new();
        fake.add_session("wd-relay", true);
        TracedSession::new(fake).nudge("wd-relay", "health check").await
    });

    assert!(result.is_ok());
    assert_log(&logs, "nudge span", "session.nudge");
    assert_log(&logs, "nudge completion", "nudged");
}

#[test]
#[serial(tracing)]
fn send_literal_logs_error_for_missing_session() {
    let (logs, result) = with_tracing(|| async {
        TracedSession::new(FakeSessionAdapter::new())
            .send_literal("nonexistent", "hello")
            .await
    });

    assert!(result.is_err());
    assert_log(&logs, "send failure", "send_literal failed");
}

#[tokio::test]
#[parallel(tracing)]
async fn delegates_create_to_inner() {
    let fake = FakeSessionAdapter::new();
    let traced = TracedSession::new(fake.clone());

    traced
        .create("wd-gastown-nux", Path::new("/tmp"))
        .await
        .unwrap();

    match &fake.calls()[0] {
        SessionCall::Create { name, cwd } => {
            assert_eq!(name, "wd-gastown-nux");
            assert_eq!(cwd, &PathBuf::from("/tmp"));
        }
        other => panic!("Expected Create call, got {:?}", other),
    }
}

#[tokio::test]
#[parallel(tracing)]
async fn liveness_queries_delegate_to_inner() {
    let fake = FakeSessionAdapter::new();
    let traced = TracedSession::new(fake.clone());
    fake.add_session("wd-relay", true);

    assert!(traced.has_session("wd-relay").await.unwrap());
    assert!(traced.is_program_running("wd-relay", "claude").await.unwrap());
    fake.set_program_running("wd-relay", false);
    assert!(!traced.is_program_running("wd-relay", "claude").await.unwrap());
    assert!(!traced.has_session("unknown").await.unwrap());
}

#[tokio::test(start_paused = true)]
#[parallel(tracing)]
async fn ensure_fresh_uses_wrapped_operations() {
    let fake = FakeSessionAdapter::new();
    let traced = TracedSession::new(fake.clone());
    fake.add_session("wd-relay", false);

    traced
        .ensure_fresh("wd-relay", Path::new("/tmp"), "claude")
        .await
        .unwrap();

    assert_eq!(fake.kill_count("wd-relay"), 1);
    assert_eq!(fake.create_count("wd-relay"), 1);
}
