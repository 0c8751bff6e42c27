// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared invocation of the `bd` command line tool

use crate::env::bd_program;
use crate::subprocess::{run_with_timeout, stderr_of, LEDGER_TIMEOUT};
use std::path::Path;
use tokio::process::Command;

/// Run `bd --no-daemon <args>` in `root` and return stdout.
///
/// `Ok(None)` means bd reported the addressed item as missing.
pub(crate) async fn run(root: &Path, args: &[&str]) -> Result<Option<Vec<u8>>, String> {
    let mut cmd = Command::new(bd_program());
    cmd.arg("--no-daemon").args(args).current_dir(root);
    let description = match args {
        [first, second, ..] if *first == "mail" || *first == "agent" => {
            format!("bd {} {}", first, second)
        }
        [first, ..] => format!("bd {}", first),
        [] => "bd".to_string(),
    };
    let output = run_with_timeout(cmd, LEDGER_TIMEOUT, &description).await?;

    let stderr = stderr_of(&output);
    if is_not_found(&stderr) {
        return Ok(None);
    }
    if !output.status.success() {
        return Err(format!("{}: {}", description, stderr));
    }
    // --no-daemon can exit 0 with empty stdout and the error on stderr
    if output.stdout.is_empty() && !stderr.is_empty() {
        return Err(format!("{}: {}", description, stderr));
    }
    Ok(Some(output.stdout))
}

fn is_not_found(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.contains("not found") || lower.contains("no issue found")
}

#[cfg(test)]
#[path = "bd_script.rs"]
pub(crate) mod script;
