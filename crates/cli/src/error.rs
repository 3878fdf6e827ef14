// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::engine::{EngineError, StoreError};
use crate::network::MonitorError;

/// All possible errors that can occur in the chatsync library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("config file not found: {0}\n  hint: omit --config to use defaults")]
    ConfigNotFound(String),

    #[error("invalid remote URL '{0}'\n  hint: must start with ws:// or wss://")]
    InvalidRemoteUrl(String),

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("another session is already running for {0}\n  hint: stop the other 'chatsync run' first")]
    SessionLocked(String),

    #[error("invalid payload: {0}\n  hint: payload must be a JSON value, e.g. '{{\"body\":\"hi\"}}'")]
    InvalidPayload(String),

    #[error("{field} cannot be empty")]
    FieldEmpty { field: &'static str },

    #[error("sync failed: {0}")]
    SyncFailed(String),

    #[error("coordinator is stopped")]
    Stopped,

    #[error(transparent)]
    Core(#[from] cs_core::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for chatsync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
