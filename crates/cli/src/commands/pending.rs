// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::engine::LocalStore;
use crate::error::Result;

#[derive(Debug, Serialize)]
pub struct PendingChange {
    pub id: String,
    pub table: String,
    pub record_id: String,
    pub deleted: bool,
    pub updated_at: DateTime<Utc>,
}

/// Outbox summary.
#[derive(Debug, Serialize)]
pub struct PendingReport {
    pub pending: usize,
    pub unsynced: bool,
    pub changes: Vec<PendingChange>,
}

impl PendingReport {
    pub fn collect(store: &LocalStore) -> Result<Self> {
        let changes: Vec<PendingChange> = store
            .pending()?
            .into_iter()
            .map(|c| PendingChange {
                id: c.id,
                table: c.table,
                record_id: c.record_id,
                deleted: c.deleted,
                updated_at: c.updated_at,
            })
            .collect();
        Ok(PendingReport {
            pending: changes.len(),
            unsynced: !changes.is_empty(),
            changes,
        })
    }

    pub fn render(&self, output: OutputFormat) -> Result<String> {
        match output {
            OutputFormat::Text => {
                if self.changes.is_empty() {
                    return Ok("No pending changes.".to_string());
                }
                let noun = if self.pending == 1 { "change" } else { "changes" };
                let mut out = format!("{} {} pending:", self.pending, noun);
                for c in &self.changes {
                    let action = if c.deleted { " (delete)" } else { "" };
                    out.push_str(&format!(
                        "\n  {} {}/{}{}  {}",
                        c.id,
                        c.table,
                        c.record_id,
                        action,
                        c.updated_at.to_rfc3339()
                    ));
                }
                Ok(out)
            }
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

pub fn run(config: &Config, output: OutputFormat) -> Result<()> {
    let store = LocalStore::open(&config.database_path())?;
    let report = PendingReport::collect(&store)?;
    println!("{}", report.render(output)?);
    Ok(())
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
