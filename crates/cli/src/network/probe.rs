// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity monitor backed by active probes.
//!
//! Link state comes from a TCP connect to `probe_addr`; internet
//! reachability from resolving `reachability_host`. A background task polls
//! both on a fixed interval and notifies listeners when the result changes.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::{timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use cs_core::ConnectivityState;

use super::{MonitorError, NetworkMonitor};
use crate::subscription::{Listener, ListenerSet, Subscription};

/// Configuration for [`ProbeMonitor`].
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// IP:port to open a TCP connection to.
    pub probe_addr: String,
    /// host:port resolved through DNS to decide internet reachability.
    pub reachability_host: String,
    /// How often the background task probes.
    pub poll_interval: Duration,
    /// Upper bound for each individual probe.
    pub probe_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            probe_addr: "1.1.1.1:53".to_string(),
            reachability_host: "example.com:443".to_string(),
            poll_interval: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(3),
        }
    }
}

/// Probe-driven [`NetworkMonitor`].
pub struct ProbeMonitor {
    config: ProbeConfig,
    listeners: ListenerSet<ConnectivityState>,
    last: Mutex<Option<ConnectivityState>>,
    cancel: CancellationToken,
}

impl ProbeMonitor {
    pub fn new(config: ProbeConfig) -> Self {
        ProbeMonitor {
            config,
            listeners: ListenerSet::new(),
            last: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    /// Start the background polling task.
    ///
    /// Must be called from within a tokio runtime. The task runs until
    /// [`ProbeMonitor::stop`] is called or the monitor is dropped.
    pub fn spawn(self: &Arc<Self>) {
        let monitor = Arc::downgrade(self);
        let cancel = self.cancel.clone();
        let period = self.config.poll_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let Some(monitor) = monitor.upgrade() else {
                    break;
                };
                match monitor.probe().await {
                    Ok(state) => monitor.publish(state),
                    Err(e) => tracing::warn!("connectivity poll failed: {}", e),
                }
            }
            tracing::debug!("connectivity polling stopped");
        });
    }

    /// Stop the background polling task.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Run one probe of link state and reachability.
    pub async fn probe(&self) -> Result<ConnectivityState, MonitorError> {
        let addr: SocketAddr = self
            .config
            .probe_addr
            .parse()
            .map_err(|_| MonitorError::InvalidAddress(self.config.probe_addr.clone()))?;

        let is_connected = match timeout(self.config.probe_timeout, TcpStream::connect(addr)).await
        {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                tracing::debug!("link probe to {} failed: {}", addr, e);
                false
            }
            Err(_) => false,
        };

        if !is_connected {
            return Ok(ConnectivityState::offline());
        }

        let host = self.config.reachability_host.as_str();
        let reachable = match timeout(self.config.probe_timeout, lookup_host(host)).await {
            Ok(Ok(mut addrs)) => Some(addrs.next().is_some()),
            Ok(Err(e)) => {
                tracing::debug!("reachability lookup of {} failed: {}", host, e);
                Some(false)
            }
            // Slow DNS is not proof of anything either way
            Err(_) => None,
        };

        Ok(ConnectivityState::new(true, reachable))
    }

    /// Record a probe result and notify listeners if it changed.
    fn publish(&self, state: ConnectivityState) {
        let changed = {
            let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
            let changed = *last != Some(state);
            *last = Some(state);
            changed
        };
        if changed {
            tracing::info!("connectivity changed: {}", state);
            self.listeners.emit(state);
        }
    }
}

impl NetworkMonitor for ProbeMonitor {
    fn subscribe(&self, listener: Listener<ConnectivityState>) -> Subscription {
        self.listeners.subscribe(listener)
    }

    fn current_state(&self) -> BoxFuture<'_, Result<ConnectivityState, MonitorError>> {
        let limit = self.config.probe_timeout * 2;
        Box::pin(async move {
            timeout(limit, self.probe())
                .await
                .map_err(|_| MonitorError::Timeout(limit))?
        })
    }
}

impl Drop for ProbeMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
