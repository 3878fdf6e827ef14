// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for cs-core operations.

use thiserror::Error;

/// All possible errors that can occur in cs-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid sync trigger: '{0}'\n  hint: valid triggers are: mount, reconnect, periodic, manual")]
    InvalidTrigger(String),

    #[error("{field} cannot be empty")]
    FieldEmpty { field: &'static str },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for cs-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
