// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-key rate limiting for nudges and notifications.
//!
//! In memory only: a restarted supervisor may poke once more than strictly
//! needed, which is harmless.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Interval after the first poke
pub const BACKOFF_BASE: Duration = Duration::from_secs(5 * 60);

/// Intervals stop doubling here
pub const BACKOFF_CAP: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy)]
struct Entry {
    last: Instant,
    interval: Duration,
}

/// Doubling backoff per key, reset when the condition clears
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
    entries: HashMap<String, Entry>,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BACKOFF_BASE, BACKOFF_CAP)
    }
}

impl Backoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap: cap.max(base),
            entries: HashMap::new(),
        }
    }

    /// Whether `key` may be poked at `now`
    pub fn ready(&self, key: &str, now: Instant) -> bool {
        match self.entries.get(key) {
            None => true,
            Some(entry) => now.saturating_duration_since(entry.last) >= entry.interval,
        }
    }

    /// Record a poke, doubling the wait before the next one
    pub fn record(&mut self, key: &str, now: Instant) {
        let (base, cap) = (self.base, self.cap);
        self.entries
            .entry(key.to_string())
            .and_modify(|entry| {
                entry.last = now;
                entry.interval = (entry.interval * 2).min(cap);
            })
            .or_insert(Entry {
                last: now,
                interval: base,
            });
    }

    /// The condition cleared: the next poke goes out immediately
    pub fn reset(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop every key under `prefix` that `keep` rejects
    pub fn retain_prefixed(&mut self, prefix: &str, keep: impl Fn(&str) -> bool) {
        self.entries
            .retain(|key, _| !key.starts_with(prefix) || keep(key));
    }

    /// Current wait after the last poke, if `key` has been poked
    pub fn interval(&self, key: &str) -> Option<Duration> {
        self.entries.get(key).map(|entry| entry.interval)
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
