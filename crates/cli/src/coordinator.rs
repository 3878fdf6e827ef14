// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync coordination.
//!
//! The [`SyncCoordinator`] decides when the engine runs. It owns the
//! single-flight guard: at most one sync is ever in flight, and triggers that
//! arrive meanwhile collapse into one follow-up run.
//!
//! Triggers:
//! - mount: once when the session starts
//! - reconnect: on every offline to online transition
//! - periodic: every interval, only when online with unsynced changes
//! - manual: on request
//!
//! Failures are logged and counted. They never stop later triggers, and a
//! failed run is not retried early.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use cs_core::{SyncOutcome, SyncRun, SyncTrigger};

use crate::engine::SyncEngine;
use crate::network::NetworkMonitor;

/// Default period of the background check.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(300_000);

/// What happened to a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new run was spawned.
    Started,
    /// A run was already in flight; this trigger folded into its follow-up.
    Coalesced,
    /// The coordinator has been stopped.
    Closed,
}

/// Result of one periodic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodicCheck {
    /// Not online; the engine was not consulted.
    Offline,
    /// Connectivity could not be determined this tick.
    Unknown,
    /// Online but nothing is waiting to be pushed.
    NothingPending,
    /// Asking the engine for pending changes failed.
    CheckFailed,
    /// A periodic sync was requested.
    Triggered(TriggerOutcome),
    /// The coordinator was stopped before or during the check.
    Stopped,
}

/// Counters and the most recent run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncStats {
    pub started: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Triggers that arrived while a run was in flight.
    pub coalesced: u64,
    pub in_flight: bool,
    pub last_run: Option<SyncRun>,
}

#[derive(Default)]
struct RunState {
    in_flight: bool,
    rerun: Option<SyncTrigger>,
    closed: bool,
    timer_started: bool,
    stats: SyncStats,
}

/// The only caller of [`SyncEngine::sync`].
pub struct SyncCoordinator {
    engine: Arc<dyn SyncEngine>,
    monitor: Arc<dyn NetworkMonitor>,
    interval: Duration,
    state: Mutex<RunState>,
    busy: watch::Sender<bool>,
    cancel: CancellationToken,
}

impl SyncCoordinator {
    /// Creates a coordinator. Nothing runs until [`start`](Self::start) or a trigger.
    pub fn new(
        engine: Arc<dyn SyncEngine>,
        monitor: Arc<dyn NetworkMonitor>,
        interval: Duration,
    ) -> Arc<Self> {
        let (busy, _) = watch::channel(false);
        Arc::new(SyncCoordinator {
            engine,
            monitor,
            interval: interval.max(Duration::from_millis(1)),
            state: Mutex::new(RunState::default()),
            busy,
            cancel: CancellationToken::new(),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Session start: sync once regardless of pending changes.
    pub fn on_mount(self: &Arc<Self>) -> TriggerOutcome {
        self.trigger(SyncTrigger::Mount)
    }

    /// Connectivity came back: sync once.
    pub fn on_connectivity_restored(self: &Arc<Self>) -> TriggerOutcome {
        self.trigger(SyncTrigger::Reconnect)
    }

    pub fn trigger_manual(self: &Arc<Self>) -> TriggerOutcome {
        self.trigger(SyncTrigger::Manual)
    }

    /// Request a run. Must be called from within a tokio runtime.
    pub fn trigger(self: &Arc<Self>, reason: SyncTrigger) -> TriggerOutcome {
        {
            let mut state = self.state();
            if state.closed {
                tracing::debug!("coordinator stopped, ignoring {} trigger", reason);
                return TriggerOutcome::Closed;
            }
            if state.in_flight {
                state.stats.coalesced += 1;
                if state.rerun.is_none() {
                    state.rerun = Some(reason);
                }
                tracing::debug!("sync already in progress, {} trigger coalesced", reason);
                return TriggerOutcome::Coalesced;
            }
            state.in_flight = true;
            state.stats.in_flight = true;
            self.busy.send_replace(true);
        }

        tokio::spawn(Arc::clone(self).run_loop(reason));
        TriggerOutcome::Started
    }

    /// Run `reason`, then any follow-up that was requested meanwhile.
    async fn run_loop(self: Arc<Self>, mut reason: SyncTrigger) {
        loop {
            self.state().stats.started += 1;
            let started_at = Utc::now();
            tracing::debug!("sync started ({})", reason);

            let outcome = match self.engine.sync().await {
                Ok(report) => {
                    tracing::info!(
                        "sync complete ({}): pushed {}, pulled {}",
                        reason,
                        report.pushed,
                        report.pulled
                    );
                    SyncOutcome::Success(report)
                }
                Err(e) => {
                    tracing::warn!("sync failed ({}): {}", reason, e);
                    SyncOutcome::failure(e)
                }
            };

            let next = {
                let mut state = self.state();
                if outcome.is_success() {
                    state.stats.succeeded += 1;
                } else {
                    state.stats.failed += 1;
                }
                state.stats.last_run = Some(SyncRun {
                    trigger: reason,
                    started_at,
                    finished_at: Utc::now(),
                    outcome,
                });

                let next = state.rerun.take();
                if next.is_none() {
                    state.in_flight = false;
                    state.stats.in_flight = false;
                    self.busy.send_replace(false);
                }
                next
            };

            match next {
                Some(rerun) => reason = rerun,
                None => break,
            }
        }
    }

    /// One background tick: sync only when online with unsynced changes.
    pub async fn run_periodic_check(self: &Arc<Self>) -> PeriodicCheck {
        if self.is_stopped() {
            return PeriodicCheck::Stopped;
        }
        let state = match self.monitor.current_state().await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("connectivity check failed: {}", e);
                return PeriodicCheck::Unknown;
            }
        };
        if !state.is_online() {
            tracing::debug!("periodic check skipped: {}", state);
            return PeriodicCheck::Offline;
        }
        // The poll can outlive a stop
        if self.is_stopped() {
            return PeriodicCheck::Stopped;
        }

        match self.engine.has_unsynced_changes().await {
            Ok(true) => PeriodicCheck::Triggered(self.trigger(SyncTrigger::Periodic)),
            Ok(false) => {
                tracing::debug!("periodic check: nothing pending");
                PeriodicCheck::NothingPending
            }
            Err(e) => {
                tracing::warn!("pending check failed: {}", e);
                PeriodicCheck::CheckFailed
            }
        }
    }

    /// Mount sync plus the periodic timer. Later calls do nothing.
    pub fn start(self: &Arc<Self>) {
        {
            let mut state = self.state();
            if state.closed || state.timer_started {
                return;
            }
            state.timer_started = true;
        }

        self.on_mount();

        let weak = Arc::downgrade(self);
        let cancel = self.cancel.clone();
        let period = self.interval;
        tokio::spawn(async move {
            run_timer(weak, cancel, period).await;
        });
        tracing::info!("sync coordinator started, checking every {:?}", period);
    }

    /// Cancel the timer, drop any queued follow-up, refuse new triggers.
    ///
    /// A run already in flight is left to finish.
    pub fn stop(&self) {
        {
            let mut state = self.state();
            if state.closed {
                return;
            }
            state.closed = true;
            state.rerun = None;
        }
        self.cancel.cancel();
        tracing::info!("sync coordinator stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.state().closed
    }

    /// Wait until no run is in flight.
    pub async fn wait_idle(&self) {
        let mut busy = self.busy.subscribe();
        // The sender lives as long as self, so this cannot fail
        let _ = busy.wait_for(|busy| !*busy).await;
    }

    pub fn stats(&self) -> SyncStats {
        self.state().stats.clone()
    }
}

impl Drop for SyncCoordinator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_timer(coordinator: Weak<SyncCoordinator>, cancel: CancellationToken, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let Some(coordinator) = coordinator.upgrade() else {
                    break;
                };
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    check = coordinator.run_periodic_check() => {
                        tracing::debug!("periodic check: {:?}", check);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
