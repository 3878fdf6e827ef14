// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed local store.
//!
//! Holds the current value of every record, the outbox of changes not yet
//! acknowledged by the remote, and the pull cursor.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use cs_core::Change;

/// SQL schema for the local store.
pub const SCHEMA: &str = r#"
-- Current value of every known record
CREATE TABLE IF NOT EXISTS records (
    table_name TEXT NOT NULL,
    record_id TEXT NOT NULL,
    payload TEXT NOT NULL,
    deleted INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL,
    change_id TEXT NOT NULL,
    PRIMARY KEY (table_name, record_id)
);

-- Local changes waiting for a push acknowledgement
CREATE TABLE IF NOT EXISTS outbox (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    change_id TEXT NOT NULL UNIQUE,
    change_json TEXT NOT NULL,
    queued_at TEXT NOT NULL
);

-- Key/value sync bookkeeping (pull cursor)
CREATE TABLE IF NOT EXISTS sync_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

const CURSOR_KEY: &str = "pull_cursor";

/// Errors from the local store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(value: &str, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(StoreError::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

/// Parse a JSON column from the database.
fn parse_json<T: serde::de::DeserializeOwned>(value: &str, column: &str) -> rusqlite::Result<T> {
    serde_json::from_str(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(StoreError::CorruptedData(format!(
                "invalid json in column '{column}': {e}"
            ))),
        )
    })
}

/// Map a row to a Change.
///
/// Expected columns: change_id, table_name, record_id, payload, deleted, updated_at
fn row_to_change(row: &rusqlite::Row) -> rusqlite::Result<Change> {
    let payload: String = row.get(3)?;
    let updated_at: String = row.get(5)?;
    Ok(Change {
        id: row.get(0)?,
        table: row.get(1)?,
        record_id: row.get(2)?,
        payload: parse_json(&payload, "payload")?,
        deleted: row.get(4)?,
        updated_at: parse_timestamp(&updated_at, "updated_at")?,
    })
}

/// Local record store with an outbox of unpushed changes.
pub struct LocalStore {
    conn: Mutex<Connection>,
}

impl LocalStore {
    /// Open the store at `path`, creating the file and schema if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(LocalStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a local mutation and queue it for the next push.
    ///
    /// Both writes happen in one transaction.
    pub fn record_change(&self, change: &Change) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        write_if_newer(&tx, change)?;
        tx.execute(
            "INSERT OR IGNORE INTO outbox (change_id, change_json, queued_at)
             VALUES (?1, ?2, ?3)",
            params![
                change.id,
                serde_json::to_string(change)?,
                Utc::now().to_rfc3339()
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Queued changes in the order they were made.
    pub fn pending(&self) -> Result<Vec<Change>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT change_json FROM outbox ORDER BY seq")?;
        let changes = stmt
            .query_map([], |row| {
                let json: String = row.get(0)?;
                parse_json::<Change>(&json, "change_json")
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(changes)
    }

    /// Number of queued changes.
    pub fn pending_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM outbox", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Remove acknowledged changes from the outbox.
    ///
    /// Unknown ids are ignored. Returns how many rows were removed.
    pub fn acknowledge(&self, change_ids: &[String]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut removed = 0;
        for id in change_ids {
            removed += tx.execute("DELETE FROM outbox WHERE change_id = ?1", [id])?;
        }
        tx.commit()?;
        Ok(removed)
    }

    /// Apply changes pulled from the remote, last writer wins.
    ///
    /// Returns how many changes replaced the local value.
    pub fn apply_remote(&self, changes: &[Change]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut applied = 0;
        for change in changes {
            if write_if_newer(&tx, change)? {
                applied += 1;
            }
        }
        tx.commit()?;
        Ok(applied)
    }

    /// Current value of a record, including tombstones.
    pub fn record(&self, table: &str, record_id: &str) -> Result<Option<Change>> {
        let conn = self.conn();
        Ok(current(&conn, table, record_id)?)
    }

    /// Server cursor of the last completed pull (0 before the first one).
    pub fn cursor(&self) -> Result<u64> {
        let value: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM sync_state WHERE key = ?1",
                [CURSOR_KEY],
                |row| row.get(0),
            )
            .optional()?;
        match value {
            None => Ok(0),
            Some(v) => v
                .parse()
                .map_err(|_| StoreError::CorruptedData(format!("invalid cursor '{v}'"))),
        }
    }

    pub fn set_cursor(&self, cursor: u64) -> Result<()> {
        self.conn().execute(
            "INSERT INTO sync_state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![CURSOR_KEY, cursor.to_string()],
        )?;
        Ok(())
    }
}

fn current(conn: &Connection, table: &str, record_id: &str) -> rusqlite::Result<Option<Change>> {
    conn.query_row(
        "SELECT change_id, table_name, record_id, payload, deleted, updated_at
         FROM records WHERE table_name = ?1 AND record_id = ?2",
        params![table, record_id],
        row_to_change,
    )
    .optional()
}

/// Write `change` unless the stored value supersedes it. Returns true if written.
fn write_if_newer(tx: &Transaction<'_>, change: &Change) -> Result<bool> {
    if let Some(existing) = current(tx, &change.table, &change.record_id)? {
        if !change.supersedes(&existing) {
            return Ok(false);
        }
    }
    tx.execute(
        "INSERT INTO records (table_name, record_id, payload, deleted, updated_at, change_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(table_name, record_id) DO UPDATE SET
             payload = excluded.payload,
             deleted = excluded.deleted,
             updated_at = excluded.updated_at,
             change_id = excluded.change_id",
        params![
            change.table,
            change.record_id,
            change.payload.to_string(),
            change.deleted,
            change.updated_at.to_rfc3339(),
            change.id
        ],
    )?;
    Ok(true)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
