// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

pub fn chatsync() -> Command {
    cargo_bin_cmd!("chatsync")
}

/// Temp dir with a config.toml pointing the database inside it.
///
/// The remote URL points at a closed local port so nothing leaves the machine.
pub fn temp_config() -> TempDir {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("chat.db");
    let config = format!(
        r#"[remote]
url = "ws://127.0.0.1:9"
request_timeout_ms = 500

[sync]
database = {:?}

[network]
probe_addr = "127.0.0.1:9"
reachability_host = "localhost:9"
probe_timeout_ms = 500
"#,
        db.display().to_string()
    );
    std::fs::write(temp.path().join("config.toml"), config).unwrap();
    temp
}

/// `chatsync --config <temp>/config.toml`
pub fn cmd_in(temp: &TempDir) -> Command {
    let mut cmd = chatsync();
    cmd.arg("--config").arg(temp.path().join("config.toml"));
    cmd
}
