// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles for the monitor, presence, engine, and transport seams.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use futures_util::future::BoxFuture;
use tokio::sync::Semaphore;

use cs_core::protocol::{ClientMessage, ServerMessage};
use cs_core::{Change, ConnectivityState, PresenceRoster, SyncReport};

use crate::engine::{EngineError, SyncEngine};
use crate::network::{MonitorError, NetworkMonitor};
use crate::presence::PresenceChannel;
use crate::subscription::{Listener, ListenerSet, Subscription};
use crate::transport::{Transport, TransportError, TransportResult};

/// Fixed timestamp `secs` seconds after the epoch.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// A chat message change for record `id`.
pub fn message_change(id: &str, body: &str, secs: i64) -> Change {
    Change::upsert("messages", id, serde_json::json!({ "body": body }), at(secs)).unwrap()
}

/// Yield until spawned tasks have had a chance to run.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Network monitor
// ─────────────────────────────────────────────────────────────────────────────

/// Monitor driven by the test: `emit` delivers an event, `set_current`
/// controls what the point-in-time poll returns.
#[derive(Clone)]
pub struct MockMonitor {
    listeners: Arc<ListenerSet<ConnectivityState>>,
    current: Arc<Mutex<Result<ConnectivityState, String>>>,
    polls: Arc<AtomicUsize>,
    held: Arc<AtomicBool>,
    gate: Arc<Semaphore>,
}

impl MockMonitor {
    pub fn new() -> Self {
        MockMonitor {
            listeners: Arc::new(ListenerSet::new()),
            current: Arc::new(Mutex::new(Ok(ConnectivityState::online()))),
            polls: Arc::new(AtomicUsize::new(0)),
            held: Arc::new(AtomicBool::new(false)),
            gate: Arc::new(Semaphore::new(0)),
        }
    }

    /// Make every subsequent poll block until released.
    pub fn hold_polls(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release_polls(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn emit(&self, state: ConnectivityState) {
        self.listeners.emit(state);
    }

    pub fn set_current(&self, state: ConnectivityState) {
        *self.current.lock().unwrap() = Ok(state);
    }

    pub fn fail_polls(&self, message: &str) {
        *self.current.lock().unwrap() = Err(message.to_string());
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

impl NetworkMonitor for MockMonitor {
    fn subscribe(&self, listener: Listener<ConnectivityState>) -> Subscription {
        self.listeners.subscribe(listener)
    }

    fn current_state(&self) -> BoxFuture<'_, Result<ConnectivityState, MonitorError>> {
        Box::pin(async move {
            self.polls.fetch_add(1, Ordering::SeqCst);
            if self.held.load(Ordering::SeqCst) {
                self.gate.acquire().await.unwrap().forget();
            }
            self.current
                .lock()
                .unwrap()
                .clone()
                .map_err(MonitorError::Probe)
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Presence channel
// ─────────────────────────────────────────────────────────────────────────────

/// Presence channel that records subscribe calls and lets the test push rosters.
#[derive(Clone)]
pub struct MockPresence {
    listeners: Arc<ListenerSet<PresenceRoster>>,
    subscribe_calls: Arc<Mutex<Vec<String>>>,
}

impl MockPresence {
    pub fn new() -> Self {
        MockPresence {
            listeners: Arc::new(ListenerSet::new()),
            subscribe_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push_roster(&self, users: &[&str]) {
        self.listeners.emit(users.iter().copied().collect());
    }

    pub fn subscribed_identities(&self) -> Vec<String> {
        self.subscribe_calls.lock().unwrap().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl PresenceChannel for MockPresence {
    fn subscribe(&self, identity: Option<&str>, listener: Listener<PresenceRoster>) -> Subscription {
        let Some(user_id) = identity else {
            return Subscription::noop();
        };
        self.subscribe_calls.lock().unwrap().push(user_id.to_string());
        self.listeners.subscribe(listener)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sync engine
// ─────────────────────────────────────────────────────────────────────────────

/// Engine double that counts calls and measures how many syncs overlap.
///
/// With `hold()` set, each `sync()` waits for a permit from `release()`,
/// which lets tests keep a run in flight while firing more triggers.
#[derive(Clone)]
pub struct MockEngine {
    sync_calls: Arc<AtomicUsize>,
    check_calls: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
    pending: Arc<AtomicBool>,
    fail_next: Arc<AtomicUsize>,
    fail_checks: Arc<AtomicBool>,
    held: Arc<AtomicBool>,
    gate: Arc<Semaphore>,
}

impl MockEngine {
    pub fn new() -> Self {
        MockEngine {
            sync_calls: Arc::new(AtomicUsize::new(0)),
            check_calls: Arc::new(AtomicUsize::new(0)),
            active: Arc::new(AtomicUsize::new(0)),
            max_active: Arc::new(AtomicUsize::new(0)),
            pending: Arc::new(AtomicBool::new(false)),
            fail_next: Arc::new(AtomicUsize::new(0)),
            fail_checks: Arc::new(AtomicBool::new(false)),
            held: Arc::new(AtomicBool::new(false)),
            gate: Arc::new(Semaphore::new(0)),
        }
    }

    pub fn sync_calls(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }

    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn set_pending(&self, pending: bool) {
        self.pending.store(pending, Ordering::SeqCst);
    }

    /// Make the next `n` syncs fail.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn fail_checks(&self, fail: bool) {
        self.fail_checks.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `sync()` block until released.
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Let `n` held syncs finish.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

impl SyncEngine for MockEngine {
    fn sync(&self) -> BoxFuture<'_, Result<SyncReport, EngineError>> {
        Box::pin(async move {
            self.sync_calls.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);

            if self.held.load(Ordering::SeqCst) {
                self.gate.acquire().await.unwrap().forget();
            } else {
                tokio::task::yield_now().await;
            }

            self.active.fetch_sub(1, Ordering::SeqCst);

            let failed = self
                .fail_next
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failed {
                return Err(EngineError::Rejected("mock failure".into()));
            }
            self.pending.store(false, Ordering::SeqCst);
            Ok(SyncReport {
                pushed: 1,
                pulled: 0,
            })
        })
    }

    fn has_unsynced_changes(&self) -> BoxFuture<'_, Result<bool, EngineError>> {
        Box::pin(async move {
            self.check_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_checks.load(Ordering::SeqCst) {
                return Err(EngineError::Rejected("mock check failure".into()));
            }
            Ok(self.pending.load(Ordering::SeqCst))
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────────────────────────

/// Mock transport for testing without real sockets.
///
/// Clones share state, so a test can keep a handle after moving a clone
/// into the component under test.
#[derive(Clone)]
pub struct MockTransport {
    connected: Arc<AtomicBool>,
    /// Messages that will be returned by recv().
    incoming: Arc<Mutex<VecDeque<ServerMessage>>>,
    /// Messages that were sent via send().
    outgoing: Arc<Mutex<Vec<ClientMessage>>>,
    /// Whether connect should fail.
    connect_should_fail: Arc<AtomicBool>,
    /// Whether send should fail.
    send_should_fail: Arc<AtomicBool>,
    connects: Arc<AtomicUsize>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport {
            connected: Arc::new(AtomicBool::new(false)),
            incoming: Arc::new(Mutex::new(VecDeque::new())),
            outgoing: Arc::new(Mutex::new(Vec::new())),
            connect_should_fail: Arc::new(AtomicBool::new(false)),
            send_should_fail: Arc::new(AtomicBool::new(false)),
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a message that will be returned by recv().
    pub fn queue_incoming(&self, msg: ServerMessage) {
        self.incoming.lock().unwrap().push_back(msg);
    }

    /// Get all messages that were sent.
    pub fn get_outgoing(&self) -> Vec<ClientMessage> {
        self.outgoing.lock().unwrap().clone()
    }

    /// Set whether connect should fail.
    pub fn set_connect_fail(&self, fail: bool) {
        self.connect_should_fail.store(fail, Ordering::SeqCst);
    }

    /// Set whether send should fail.
    pub fn set_send_fail(&self, fail: bool) {
        self.send_should_fail.store(fail, Ordering::SeqCst);
    }

    /// Number of successful connects.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, url: &str) -> BoxFuture<'_, TransportResult<()>> {
        let url = url.to_string();
        Box::pin(async move {
            if self.connect_should_fail.load(Ordering::SeqCst) {
                Err(TransportError::Connect {
                    url,
                    reason: "mock failure".into(),
                })
            } else {
                self.connected.store(true, Ordering::SeqCst);
                self.connects.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            self.connected.store(false, Ordering::SeqCst);
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            if !self.connected.load(Ordering::SeqCst) {
                return Err(TransportError::Closed);
            }
            if self.send_should_fail.load(Ordering::SeqCst) {
                self.connected.store(false, Ordering::SeqCst);
                return Err(TransportError::Send("mock send failure".into()));
            }
            self.outgoing.lock().unwrap().push(msg);
            Ok(())
        })
    }

    fn recv(&mut self) -> BoxFuture<'_, TransportResult<Option<ServerMessage>>> {
        Box::pin(async move {
            let msg = self.incoming.lock().unwrap().pop_front();
            Ok(msg)
        })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
