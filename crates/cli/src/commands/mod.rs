// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod config;
pub mod pending;
pub mod probe;
pub mod record;
pub mod run;
pub mod sync;

use crate::error::{Error, Result};

/// Runtime for commands that talk to the network.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Io(std::io::Error::other(format!("tokio: {}", e))))
}
