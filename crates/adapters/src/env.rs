// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

use crate::subprocess::TMUX_TIMEOUT;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for each tmux call (default: 10s).
pub fn tmux_timeout() -> Duration {
    parse_duration_ms("WARDEN_TMUX_TIMEOUT_MS").unwrap_or(TMUX_TIMEOUT)
}

/// Program used for ledger and mail commands (default: `bd`).
pub fn bd_program() -> String {
    std::env::var("WARDEN_BD").unwrap_or_else(|_| "bd".to_string())
}
