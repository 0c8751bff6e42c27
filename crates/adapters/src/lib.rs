// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: tmux sessions, the `bd` work ledger and
//! mail, and git working trees.

mod bd;
mod env;
pub mod ledger;
pub mod mail;
pub mod session;
pub mod subprocess;
pub mod sync;
pub mod traced;

pub use ledger::{BdLedger, LedgerError, WorkLedger};
pub use mail::{BdMailbox, MailError, Mailbox};
pub use session::{SessionAdapter, SessionError, SessionStyle, TmuxAdapter};
pub use sync::{GitWorkspaceSync, SyncError, WorkspaceSync};
pub use traced::TracedSession;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use ledger::{FakeLedger, LedgerCall};
#[cfg(any(test, feature = "test-support"))]
pub use mail::{FakeMailbox, SentMail};
#[cfg(any(test, feature = "test-support"))]
pub use session::{FakeSession, FakeSessionAdapter, SessionCall};
#[cfg(any(test, feature = "test-support"))]
pub use sync::FakeWorkspaceSync;
