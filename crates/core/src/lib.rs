// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cs-core: Shared types for the chatsync coordinator
//!
//! This crate provides the value types exchanged between the connectivity
//! monitor, the presence channel, the sync engine, and the session-owned
//! online status, plus the JSON wire protocol spoken with the remote service.

pub mod change;
pub mod connectivity;
pub mod error;
pub mod presence;
pub mod protocol;
pub mod status;
pub mod sync;

pub use change::Change;
pub use connectivity::ConnectivityState;
pub use error::{Error, Result};
pub use presence::PresenceRoster;
pub use status::OnlineStatus;
pub use sync::{SyncOutcome, SyncReport, SyncRun, SyncTrigger};
