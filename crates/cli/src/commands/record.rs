// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;

use cs_core::Change;

use crate::config::Config;
use crate::engine::LocalStore;
use crate::error::{Error, Result};

/// Build the change described by the command line.
pub fn build_change(
    table: &str,
    record_id: &str,
    payload: Option<&str>,
    delete: bool,
) -> Result<Change> {
    let now = Utc::now();
    if delete {
        return Ok(Change::delete(table, record_id, now)?);
    }
    let raw = payload.ok_or(Error::FieldEmpty { field: "payload" })?;
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| Error::InvalidPayload(e.to_string()))?;
    Ok(Change::upsert(table, record_id, value, now)?)
}

/// Apply the change locally and queue it for the next sync.
pub fn record(store: &LocalStore, change: &Change) -> Result<()> {
    store.record_change(change)?;
    tracing::debug!("queued change {} for {}/{}", change.id, change.table, change.record_id);
    Ok(())
}

pub fn run(
    config: &Config,
    table: &str,
    record_id: &str,
    payload: Option<&str>,
    delete: bool,
) -> Result<()> {
    let change = build_change(table, record_id, payload, delete)?;
    let store = LocalStore::open(&config.database_path())?;
    record(&store, &change)?;

    let verb = if change.deleted { "Deleted" } else { "Recorded" };
    println!("{} {}/{} ({})", verb, change.table, change.record_id, change.id);
    Ok(())
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
