// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Device connectivity monitoring.
//!
//! A [`NetworkMonitor`] is the only source of online/offline events. It
//! offers two views of connectivity:
//!
//! - `subscribe`: a push stream of transitions (duplicates allowed)
//! - `current_state`: a fresh point-in-time poll, for periodic checks that
//!   must not rely on a cached value
//!
//! [`ProbeMonitor`] implements it by probing a TCP endpoint and resolving a
//! well-known host name on a fixed poll interval.

mod probe;

use std::time::Duration;

use futures_util::future::BoxFuture;

use cs_core::ConnectivityState;

use crate::subscription::{Listener, Subscription};

pub use probe::{ProbeConfig, ProbeMonitor};

/// Error type for connectivity queries.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The probe address in the configuration cannot be used.
    #[error("invalid probe address '{0}'\n  hint: use an IP:port pair such as 1.1.1.1:53")]
    InvalidAddress(String),

    /// The platform query itself failed.
    #[error("connectivity probe failed: {0}")]
    Probe(String),

    /// The probe did not finish in time.
    #[error("connectivity probe timed out after {0:?}")]
    Timeout(Duration),
}

/// Source of connectivity state.
pub trait NetworkMonitor: Send + Sync {
    /// Register a listener invoked on every connectivity transition.
    fn subscribe(&self, listener: Listener<ConnectivityState>) -> Subscription;

    /// Poll the current connectivity state.
    fn current_state(&self) -> BoxFuture<'_, Result<ConnectivityState, MonitorError>>;
}
