// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Device connectivity as reported by a network monitor.
//!
//! Two signals are tracked separately: whether a network link is up at all,
//! and whether the wider internet is reachable over it. Reachability may be
//! unknown (for example right after a link comes up, or when a probe fails),
//! and an unknown reachability never counts as online.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Point-in-time connectivity of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectivityState {
    /// A network link is up.
    pub is_connected: bool,
    /// The internet is reachable over the link (`None` = not yet known).
    #[serde(default)]
    pub is_internet_reachable: Option<bool>,
}

impl ConnectivityState {
    /// Creates a connectivity state from its two signals.
    pub fn new(is_connected: bool, is_internet_reachable: Option<bool>) -> Self {
        ConnectivityState {
            is_connected,
            is_internet_reachable,
        }
    }

    /// Connected with the internet reachable.
    ///
    /// This is also the optimistic state assumed before the first report.
    pub fn online() -> Self {
        Self::new(true, Some(true))
    }

    /// No network link.
    pub fn offline() -> Self {
        Self::new(false, Some(false))
    }

    /// Link state known, reachability not known.
    pub fn unknown_reachability(is_connected: bool) -> Self {
        Self::new(is_connected, None)
    }

    /// Derived flag: connected AND internet reachable.
    pub fn is_online(&self) -> bool {
        self.is_connected && self.is_internet_reachable == Some(true)
    }
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self::online()
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reachable = match self.is_internet_reachable {
            Some(true) => "reachable",
            Some(false) => "unreachable",
            None => "unknown",
        };
        let link = if self.is_connected {
            "connected"
        } else {
            "disconnected"
        };
        write!(f, "{} (internet {})", link, reachable)
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
