// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances_both_clocks() {
    let clock = FakeClock::new();
    let t0 = clock.now();
    let u0 = clock.utc_now();

    clock.advance(Duration::from_secs(90));

    assert_eq!(clock.now() - t0, Duration::from_secs(90));
    assert_eq!(clock.utc_now() - u0, chrono::Duration::seconds(90));
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::new();
    let other = clock.clone();
    clock.advance(Duration::from_secs(5));
    assert_eq!(clock.utc_now(), other.utc_now());
}

#[test]
fn set_utc_leaves_monotonic_clock_alone() {
    let clock = FakeClock::new();
    let t0 = clock.now();
    clock.set_utc(DateTime::<Utc>::UNIX_EPOCH);
    assert_eq!(clock.utc_now(), DateTime::<Utc>::UNIX_EPOCH);
    assert_eq!(clock.now(), t0);
}

#[test]
fn system_clock_moves_forward() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}
