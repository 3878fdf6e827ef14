// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use cs_core::ConnectivityState;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::Result;
use crate::network::{NetworkMonitor, ProbeMonitor};

use super::runtime;

pub fn render(state: &ConnectivityState, output: OutputFormat) -> Result<String> {
    match output {
        OutputFormat::Text => Ok(format!(
            "{}\nonline: {}",
            state,
            if state.is_online() { "yes" } else { "no" }
        )),
        OutputFormat::Json => {
            let json = serde_json::json!({
                "is_connected": state.is_connected,
                "is_internet_reachable": state.is_internet_reachable,
                "is_online": state.is_online(),
            });
            Ok(serde_json::to_string_pretty(&json)?)
        }
    }
}

pub fn run(config: &Config, output: OutputFormat) -> Result<()> {
    let monitor = ProbeMonitor::new(config.probe());
    let state = runtime()?.block_on(monitor.current_state())?;
    println!("{}", render(&state, output)?);
    Ok(())
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
