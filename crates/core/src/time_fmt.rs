// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Short human-readable durations for log lines and notifications.

use std::time::Duration;

/// Format an age as `"45s"`, `"12m"`, `"1h30m"`, or `"3d"`.
///
/// Minutes are shown alongside hours only when non-zero.
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    match secs {
        0..=59 => format!("{}s", secs),
        60..=3599 => format!("{}m", secs / 60),
        3600..=86399 => match (secs / 3600, (secs % 3600) / 60) {
            (h, 0) => format!("{}h", h),
            (h, m) => format!("{}h{}m", h, m),
        },
        _ => format!("{}d", secs / 86400),
    }
}

/// [`format_age`] for chrono durations; negative ages read as zero.
pub fn format_signed_age(age: chrono::Duration) -> String {
    format_age(age.to_std().unwrap_or_default())
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
