// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session-owned online status.
//!
//! An [`OnlineStatusContext`] lives from login to logout. It tracks
//! connectivity and presence for consumers, and feeds the coordinator its
//! mount and reconnect triggers.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use cs_core::{ConnectivityState, OnlineStatus, PresenceRoster};

use crate::coordinator::SyncCoordinator;
use crate::network::NetworkMonitor;
use crate::presence::PresenceChannel;
use crate::subscription::{Listener, Subscription};

struct Shared {
    status: watch::Sender<OnlineStatus>,
    /// Whether the last connectivity event was offline. Every publish and
    /// the cancellation itself happen under this lock.
    was_offline: Mutex<bool>,
    cancel: CancellationToken,
}

impl Shared {
    fn new() -> Self {
        let (status, _) = watch::channel(OnlineStatus::default());
        Shared {
            status,
            was_offline: Mutex::new(false),
            cancel: CancellationToken::new(),
        }
    }

    /// Cancel once. Returns false if already cancelled.
    fn close(&self) -> bool {
        let _guard = self.was_offline.lock().unwrap_or_else(PoisonError::into_inner);
        if self.cancel.is_cancelled() {
            return false;
        }
        self.cancel.cancel();
        true
    }

    fn on_connectivity(&self, state: ConnectivityState, coordinator: &Weak<SyncCoordinator>) {
        let online = state.is_online();

        let restored = {
            let mut was_offline = self.was_offline.lock().unwrap_or_else(PoisonError::into_inner);
            if self.cancel.is_cancelled() {
                return;
            }
            let restored = online && *was_offline;
            *was_offline = !online;
            self.status.send_if_modified(|status| {
                let changed = status.is_online != online;
                status.is_online = online;
                changed
            });
            restored
        };

        if restored {
            tracing::info!("connectivity restored, syncing");
            if let Some(coordinator) = coordinator.upgrade() {
                coordinator.on_connectivity_restored();
            }
        } else {
            tracing::debug!("connectivity: {}", state);
        }
    }

    fn on_roster(&self, roster: PresenceRoster) {
        let _guard = self.was_offline.lock().unwrap_or_else(PoisonError::into_inner);
        if self.cancel.is_cancelled() {
            return;
        }
        tracing::debug!("presence roster: {} online", roster.len());
        self.status.send_modify(|status| status.online_users = roster);
    }
}

/// Online status plus the subscriptions that keep it current.
pub struct OnlineStatusContext {
    shared: Arc<Shared>,
    subscriptions: Mutex<Vec<Subscription>>,
    coordinator: Arc<SyncCoordinator>,
}

impl OnlineStatusContext {
    /// Start a session: subscribe to connectivity and presence, then start
    /// the coordinator (mount sync plus periodic timer).
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        monitor: &dyn NetworkMonitor,
        presence: &dyn PresenceChannel,
        coordinator: Arc<SyncCoordinator>,
        identity: Option<&str>,
    ) -> Self {
        let shared = Arc::new(Shared::new());

        let weak_shared = Arc::downgrade(&shared);
        let weak_coordinator = Arc::downgrade(&coordinator);
        let on_connectivity: Listener<ConnectivityState> = Arc::new(move |state| {
            if let Some(shared) = weak_shared.upgrade() {
                shared.on_connectivity(state, &weak_coordinator);
            }
        });

        let weak_shared = Arc::downgrade(&shared);
        let on_roster: Listener<PresenceRoster> = Arc::new(move |roster| {
            if let Some(shared) = weak_shared.upgrade() {
                shared.on_roster(roster);
            }
        });

        let subscriptions = vec![
            monitor.subscribe(on_connectivity),
            presence.subscribe(identity, on_roster),
        ];
        coordinator.start();
        tracing::info!(
            "session started for {}",
            identity.unwrap_or("<anonymous>")
        );

        OnlineStatusContext {
            shared,
            subscriptions: Mutex::new(subscriptions),
            coordinator,
        }
    }

    /// Current status.
    pub fn snapshot(&self) -> OnlineStatus {
        self.shared.status.borrow().clone()
    }

    /// Receiver notified on every status change.
    pub fn watch(&self) -> watch::Receiver<OnlineStatus> {
        self.shared.status.subscribe()
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator> {
        &self.coordinator
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// End the session. Safe to call more than once.
    pub fn stop(&self) {
        if !self.shared.close() {
            return;
        }
        let subscriptions = std::mem::take(
            &mut *self
                .subscriptions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        drop(subscriptions);
        self.coordinator.stop();
        tracing::info!("session stopped");
    }
}

impl Drop for OnlineStatusContext {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
