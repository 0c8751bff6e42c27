// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

use std::path::Path;
use tempfile::tempdir;

mod control;
mod startup_shutdown;

/// Config rooted in a scratch directory
fn test_config(dir: &Path) -> Config {
    Config::for_dirs(dir, dir.join("daemon"))
}
