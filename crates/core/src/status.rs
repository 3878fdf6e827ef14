// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The read-only online status projection handed to consumers.

use serde::{Deserialize, Serialize};

use crate::presence::PresenceRoster;

/// Snapshot of `{is_online, online_users}` for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineStatus {
    /// Latest connectivity verdict (connected AND internet reachable).
    pub is_online: bool,
    /// Latest presence roster, replaced wholesale on each update.
    pub online_users: PresenceRoster,
}

impl Default for OnlineStatus {
    /// Optimistically online with nobody present.
    fn default() -> Self {
        OnlineStatus {
            is_online: true,
            online_users: PresenceRoster::new(),
        }
    }
}
