// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::config::Config;
use crate::error::Result;

/// Effective configuration, with the resolved database path filled in.
pub fn effective(config: &Config) -> Result<String> {
    let mut effective = config.clone();
    effective.sync.database = Some(config.database_path());
    effective.to_toml()
}

pub fn run(config: &Config) -> Result<()> {
    print!("{}", effective(config)?);
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
