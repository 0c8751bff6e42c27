// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    zero             = { 0,      "0s" },
    under_a_minute   = { 59,     "59s" },
    one_minute       = { 60,     "1m" },
    gupp_timeout     = { 1800,   "30m" },
    one_hour         = { 3600,   "1h" },
    hour_and_minutes = { 5400,   "1h30m" },
    almost_a_day     = { 86399,  "23h59m" },
    two_days         = { 172800, "2d" },
)]
fn age(secs: u64, expected: &str) {
    assert_eq!(format_age(Duration::from_secs(secs)), expected);
}

#[test]
fn negative_signed_age_is_zero() {
    assert_eq!(format_signed_age(chrono::Duration::seconds(-30)), "0s");
    assert_eq!(format_signed_age(chrono::Duration::minutes(31)), "31m");
}
