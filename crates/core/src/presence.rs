// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Presence roster: the peers currently connected to the realtime channel.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of peer user identifiers currently connected.
///
/// Rosters are replaced wholesale on every update; there is no merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresenceRoster(BTreeSet<String>);

impl PresenceRoster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        PresenceRoster(BTreeSet::new())
    }

    /// Returns true if the given user is present.
    pub fn contains(&self, user_id: &str) -> bool {
        self.0.contains(user_id)
    }

    /// Number of distinct users present.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nobody is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates user ids in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PresenceRoster {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        PresenceRoster(
            iter.into_iter()
                .map(Into::into)
                .filter(|id: &String| !id.trim().is_empty())
                .collect(),
        )
    }
}

impl From<Vec<String>> for PresenceRoster {
    fn from(users: Vec<String>) -> Self {
        users.into_iter().collect()
    }
}

#[cfg(test)]
#[path = "presence_tests.rs"]
mod tests;
