// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted stand-in for `bd` used by adapter tests

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Install a fake `bd` that prints `stdout`, writes `stderr` and exits with
/// `code`. Every invocation's arguments are appended to `args.log`.
pub(crate) fn fake_bd(dir: &Path, stdout: &str, stderr: &str, code: i32) -> PathBuf {
    std::fs::write(dir.join("out.json"), stdout).unwrap();
    let script = dir.join("bd");
    std::fs::write(
        &script,
        format!(
            "#!/bin/sh\necho \"$@\" >> '{log}'\ncat '{out}'\nprintf '%s' '{stderr}' >&2\nexit {code}\n",
            log = dir.join("args.log").display(),
            out = dir.join("out.json").display(),
        ),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

/// Arguments of every recorded invocation, one line each.
pub(crate) fn invocations(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("args.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Run `f` with `WARDEN_BD` pointing at `script`.
pub(crate) async fn with_bd<F, Fut, T>(script: &Path, f: F) -> T
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = T>,
{
    std::env::set_var("WARDEN_BD", script);
    let result = f().await;
    std::env::remove_var("WARDEN_BD");
    result
}
