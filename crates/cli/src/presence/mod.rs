// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Presence: who else is online right now.
//!
//! A [`PresenceChannel`] turns an identity into a stream of roster
//! snapshots. Without an identity (not yet signed in) it does nothing.

mod websocket;

use cs_core::PresenceRoster;

use crate::subscription::{Listener, Subscription};

pub use websocket::{Backoff, WebSocketPresence};

/// Realtime roster subscription keyed by the local user's identity.
pub trait PresenceChannel: Send + Sync {
    /// Start receiving rosters for `identity`.
    ///
    /// A `None` identity must not attempt any subscription and returns an
    /// inactive [`Subscription`]. Cancelling the returned subscription stops
    /// the channel.
    fn subscribe(&self, identity: Option<&str>, listener: Listener<PresenceRoster>) -> Subscription;
}
