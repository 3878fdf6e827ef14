// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use cs_core::{SyncOutcome, SyncRun};

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::coordinator::{SyncCoordinator, TriggerOutcome};
use crate::error::{Error, Result};
use crate::session::{SessionLock, Stack};

use super::runtime;

/// Run one manual sync through the coordinator and wait for it.
pub async fn sync_once(coordinator: &Arc<SyncCoordinator>) -> Result<SyncRun> {
    if coordinator.trigger_manual() == TriggerOutcome::Closed {
        return Err(Error::Stopped);
    }
    coordinator.wait_idle().await;
    coordinator
        .stats()
        .last_run
        .ok_or_else(|| Error::SyncFailed("no run recorded".to_string()))
}

pub fn render(run: &SyncRun, output: OutputFormat) -> Result<String> {
    match output {
        OutputFormat::Text => match &run.outcome {
            SyncOutcome::Success(report) if report.is_noop() => Ok("Already up to date.".to_string()),
            SyncOutcome::Success(report) => Ok(format!(
                "Synced: pushed {}, pulled {}",
                report.pushed, report.pulled
            )),
            SyncOutcome::Failure { error } => Ok(format!("Sync failed: {}", error)),
        },
        OutputFormat::Json => Ok(serde_json::to_string_pretty(run)?),
    }
}

pub fn run(config: &Config, output: OutputFormat) -> Result<()> {
    let _lock = SessionLock::acquire(config)?;
    let stack = Stack::open(config)?;

    let run = runtime()?.block_on(sync_once(&stack.coordinator))?;
    stack.coordinator.stop();

    if let SyncOutcome::Failure { error } = &run.outcome {
        if output == OutputFormat::Json {
            println!("{}", render(&run, output)?);
        }
        return Err(Error::SyncFailed(error.clone()));
    }
    println!("{}", render(&run, output)?);
    Ok(())
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
