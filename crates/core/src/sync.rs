// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync run bookkeeping: why a run started and how it ended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// What caused a sync run to be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    /// Session start: catch up on changes made while the app was closed.
    Mount,
    /// Connectivity went from offline to online.
    Reconnect,
    /// Periodic safety-net check found unsynced local changes.
    Periodic,
    /// Explicit request from the user or a command.
    Manual,
}

impl SyncTrigger {
    /// Returns the string representation of the trigger.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTrigger::Mount => "mount",
            SyncTrigger::Reconnect => "reconnect",
            SyncTrigger::Periodic => "periodic",
            SyncTrigger::Manual => "manual",
        }
    }
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncTrigger {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mount" => Ok(SyncTrigger::Mount),
            "reconnect" => Ok(SyncTrigger::Reconnect),
            "periodic" => Ok(SyncTrigger::Periodic),
            "manual" => Ok(SyncTrigger::Manual),
            _ => Err(Error::InvalidTrigger(s.to_string())),
        }
    }
}

/// Counts reported by one successful push/pull cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Local changes acknowledged by the remote.
    pub pushed: usize,
    /// Remote changes applied locally.
    pub pulled: usize,
}

impl SyncReport {
    /// Returns true if the cycle moved nothing in either direction.
    pub fn is_noop(&self) -> bool {
        self.pushed == 0 && self.pulled == 0
    }
}

/// How a sync run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Success(SyncReport),
    Failure { error: String },
}

impl SyncOutcome {
    /// Creates a failure outcome from any displayable error.
    pub fn failure(error: impl fmt::Display) -> Self {
        SyncOutcome::Failure {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Success(_))
    }
}

/// Record of one completed sync run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRun {
    pub trigger: SyncTrigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: SyncOutcome,
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
