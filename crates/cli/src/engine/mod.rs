// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The sync engine seam and its SQLite/WebSocket implementation.
//!
//! The coordinator decides *when* to sync; an engine decides *how*. Only the
//! engine touches local rows during a sync.

mod remote;
mod store;

use futures_util::future::BoxFuture;

use cs_core::SyncReport;

use crate::transport::TransportError;

pub use remote::RemoteSyncEngine;
pub use store::{LocalStore, StoreError};

/// Errors from a sync attempt.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("timed out waiting for {waiting_for} after {after_ms}ms")]
    Timeout {
        waiting_for: &'static str,
        after_ms: u64,
    },

    #[error("server rejected sync: {0}")]
    Rejected(String),

    #[error("connection closed by server")]
    ConnectionClosed,
}

impl EngineError {
    /// Returns true if the connection can no longer be trusted.
    pub fn breaks_connection(&self) -> bool {
        matches!(
            self,
            EngineError::Transport(_) | EngineError::Timeout { .. } | EngineError::ConnectionClosed
        )
    }
}

/// Push/pull synchronization between the local store and the remote.
pub trait SyncEngine: Send + Sync {
    /// Push local changes, then pull remote ones. A cycle with nothing to
    /// move succeeds with an empty report.
    fn sync(&self) -> BoxFuture<'_, Result<SyncReport, EngineError>>;

    /// Whether any local change is still waiting to be pushed.
    ///
    /// Must not modify anything.
    fn has_unsynced_changes(&self) -> BoxFuture<'_, Result<bool, EngineError>>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
