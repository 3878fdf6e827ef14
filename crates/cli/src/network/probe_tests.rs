// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

fn config_for(probe_addr: String) -> ProbeConfig {
    ProbeConfig {
        probe_addr,
        reachability_host: "localhost:80".to_string(),
        poll_interval: Duration::from_millis(20),
        probe_timeout: Duration::from_millis(500),
    }
}

/// An address with nothing listening on it.
async fn closed_addr() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

#[test]
fn default_config() {
    let config = ProbeConfig::default();
    assert_eq!(config.probe_addr, "1.1.1.1:53");
    assert_eq!(config.poll_interval, Duration::from_secs(5));
}

#[tokio::test]
async fn probe_rejects_hostname_probe_addr() {
    let monitor = ProbeMonitor::new(config_for("not-an-ip:53".to_string()));
    let err = monitor.probe().await.unwrap_err();
    assert!(matches!(err, MonitorError::InvalidAddress(ref a) if a == "not-an-ip:53"));
}

#[tokio::test]
async fn probe_listening_port_is_online() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let monitor = ProbeMonitor::new(config_for(addr));
    let state = monitor.probe().await.unwrap();

    assert!(state.is_connected);
    assert_eq!(state.is_internet_reachable, Some(true));
    assert!(state.is_online());
}

#[tokio::test]
async fn probe_closed_port_is_offline() {
    let monitor = ProbeMonitor::new(config_for(closed_addr().await));
    let state = monitor.probe().await.unwrap();
    assert_eq!(state, ConnectivityState::offline());
}

#[tokio::test]
async fn current_state_polls_fresh() {
    let monitor = ProbeMonitor::new(config_for(closed_addr().await));
    let state = monitor.current_state().await.unwrap();
    assert!(!state.is_online());
}

#[test]
fn publish_notifies_only_on_change() {
    let monitor = ProbeMonitor::new(ProbeConfig::default());
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let _sub = monitor.subscribe(Arc::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    monitor.publish(ConnectivityState::online());
    monitor.publish(ConnectivityState::online());
    monitor.publish(ConnectivityState::offline());
    monitor.publish(ConnectivityState::online());

    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn spawned_poller_reports_then_stops() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let monitor = Arc::new(ProbeMonitor::new(config_for(addr)));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let _sub = monitor.subscribe(Arc::new(move |state| {
        let _ = tx.send(state);
    }));

    monitor.spawn();
    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("poller should report")
        .unwrap();
    assert!(first.is_online());

    monitor.stop();
    tokio::time::sleep(Duration::from_millis(100)).await;
    // Same state keeps arriving as "unchanged", so nothing new is queued
    assert!(rx.try_recv().is_err());
}
