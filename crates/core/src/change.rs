// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Record changes exchanged with the remote service.
//!
//! A change carries the full new payload of one record (or a tombstone) and
//! is identified by a content hash, so the same change re-sent after a
//! dropped acknowledgement is recognized as a duplicate by either side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// One mutation of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// Content hash of the change (16 hex chars).
    pub id: String,
    /// Logical table the record belongs to (e.g. "messages").
    pub table: String,
    /// Record identifier within the table.
    pub record_id: String,
    /// Full record payload after the change. `Null` for deletions.
    pub payload: serde_json::Value,
    /// Whether this change deletes the record.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    /// When the change was made; later changes win.
    pub updated_at: DateTime<Utc>,
}

impl Change {
    /// Creates an upsert change for a record.
    pub fn upsert(
        table: impl Into<String>,
        record_id: impl Into<String>,
        payload: serde_json::Value,
        updated_at: DateTime<Utc>,
    ) -> Result<Self> {
        Self::build(table.into(), record_id.into(), payload, false, updated_at)
    }

    /// Creates a deletion (tombstone) change for a record.
    pub fn delete(
        table: impl Into<String>,
        record_id: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self> {
        Self::build(
            table.into(),
            record_id.into(),
            serde_json::Value::Null,
            true,
            updated_at,
        )
    }

    fn build(
        table: String,
        record_id: String,
        payload: serde_json::Value,
        deleted: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Self> {
        if table.trim().is_empty() {
            return Err(Error::FieldEmpty { field: "table" });
        }
        if record_id.trim().is_empty() {
            return Err(Error::FieldEmpty { field: "record_id" });
        }
        let id = change_id(&table, &record_id, &payload, deleted, &updated_at);
        Ok(Change {
            id,
            table,
            record_id,
            payload,
            deleted,
            updated_at,
        })
    }

    /// Returns true if this change should replace `other` for the same record.
    ///
    /// Later `updated_at` wins; equal timestamps fall back to the id so every
    /// replica picks the same winner.
    pub fn supersedes(&self, other: &Change) -> bool {
        (self.updated_at, &self.id) > (other.updated_at, &other.id)
    }
}

/// Content hash: first 16 hex chars of SHA256 over the change fields.
fn change_id(
    table: &str,
    record_id: &str,
    payload: &serde_json::Value,
    deleted: bool,
    updated_at: &DateTime<Utc>,
) -> String {
    let input = format!(
        "{}\0{}\0{}\0{}\0{}",
        table,
        record_id,
        payload,
        deleted,
        updated_at.to_rfc3339()
    );
    let hash = Sha256::digest(input.as_bytes());
    hex::encode(&hash[..8])
}

#[cfg(test)]
#[path = "change_tests.rs"]
mod tests;
