// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cs_core::protocol::{ClientMessage, ServerMessage};
use cs_core::PresenceRoster;

use super::*;
use crate::test_helpers::{settle, MockTransport};

fn collector() -> (Listener<PresenceRoster>, Arc<Mutex<Vec<PresenceRoster>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let listener: Listener<PresenceRoster> = Arc::new(move |roster| {
        sink.lock().unwrap().push(roster);
    });
    (listener, seen)
}

/// First transport is `first`; every later attempt fails to connect.
fn one_shot_factory(first: MockTransport) -> (impl Fn() -> MockTransport + Send + Sync, Arc<AtomicUsize>) {
    let made = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&made);
    let factory = move || {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            first.clone()
        } else {
            let failing = MockTransport::new();
            failing.set_connect_fail(true);
            failing
        }
    };
    (factory, made)
}

fn single_attempt() -> Backoff {
    Backoff {
        max_retries: 1,
        initial_delay_ms: 1,
        max_delay_secs: 1,
    }
}

#[tokio::test]
async fn no_identity_means_no_connection() {
    let transport = MockTransport::new();
    let (factory, made) = one_shot_factory(transport.clone());
    let presence = WebSocketPresence::new("ws://test", single_attempt(), factory);
    let (listener, seen) = collector();

    let sub = presence.subscribe(None, listener);
    settle().await;

    assert!(!sub.is_active());
    assert_eq!(made.load(Ordering::SeqCst), 0);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn joins_and_forwards_rosters() {
    let transport = MockTransport::new();
    transport.queue_incoming(ServerMessage::roster(["alice", "bob"]));
    transport.queue_incoming(ServerMessage::pong(1));
    transport.queue_incoming(ServerMessage::roster(["alice"]));
    let (factory, _) = one_shot_factory(transport.clone());
    let presence = WebSocketPresence::new("ws://test", single_attempt(), factory);
    let (listener, seen) = collector();

    let _sub = presence.subscribe(Some("alice"), listener);
    settle().await;

    assert_eq!(
        transport.get_outgoing().first(),
        Some(&ClientMessage::join("alice"))
    );
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].contains("bob"));
    assert_eq!(seen[1].len(), 1);
}

#[tokio::test(start_paused = true)]
async fn server_error_keeps_the_last_roster() {
    let transport = MockTransport::new();
    transport.queue_incoming(ServerMessage::roster(["alice", "bob"]));
    transport.queue_incoming(ServerMessage::error("presence backend down"));
    let (factory, _) = one_shot_factory(transport.clone());
    let presence = WebSocketPresence::new("ws://test", single_attempt(), factory);
    let (listener, seen) = collector();

    let _sub = presence.subscribe(Some("alice"), listener);
    settle().await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("bob"));
}

#[tokio::test(start_paused = true)]
async fn reconnects_after_the_connection_closes() {
    let transport = MockTransport::new();
    transport.queue_incoming(ServerMessage::roster(["alice"]));
    let (factory, made) = one_shot_factory(transport.clone());
    let presence = WebSocketPresence::new(
        "ws://test",
        Backoff {
            max_retries: 2,
            initial_delay_ms: 10,
            max_delay_secs: 1,
        },
        factory,
    );
    let (listener, _seen) = collector();

    let _sub = presence.subscribe(Some("alice"), listener);
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    settle().await;

    // one good connection, then two failed attempts before giving up
    assert_eq!(made.load(Ordering::SeqCst), 3);
    assert_eq!(transport.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn connect_failure_never_delivers() {
    let transport = MockTransport::new();
    transport.set_connect_fail(true);
    transport.queue_incoming(ServerMessage::roster(["alice"]));
    let (factory, _) = one_shot_factory(transport.clone());
    let presence = WebSocketPresence::new("ws://test", single_attempt(), factory);
    let (listener, seen) = collector();

    let _sub = presence.subscribe(Some("alice"), listener);
    settle().await;

    assert!(seen.lock().unwrap().is_empty());
    assert!(transport.get_outgoing().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancelled_subscription_stops_reconnecting() {
    let transport = MockTransport::new();
    let made = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&made);
    let shared = transport.clone();
    let presence = WebSocketPresence::new(
        "ws://test",
        Backoff {
            max_retries: 0,
            initial_delay_ms: 50,
            max_delay_secs: 1,
        },
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            shared.clone()
        },
    );
    let (listener, seen) = collector();

    let sub = presence.subscribe(Some("alice"), listener);
    settle().await;
    assert!(sub.is_active());
    sub.cancel();

    transport.queue_incoming(ServerMessage::roster(["alice"]));
    let attempts = made.load(Ordering::SeqCst);
    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
    settle().await;

    assert_eq!(made.load(Ordering::SeqCst), attempts);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn subscribe_outside_runtime_is_inert() {
    let presence = WebSocketPresence::new("ws://test", Backoff::default(), MockTransport::new);
    let (listener, _) = collector();

    let sub = presence.subscribe(Some("alice"), listener);

    assert!(!sub.is_active());
}

#[test]
fn default_backoff_is_unlimited() {
    let backoff = Backoff::default();
    assert_eq!(backoff.max_retries, 0);
    assert_eq!(backoff.initial_delay_ms, 100);
    assert_eq!(backoff.max_delay_secs, 30);
}

#[test]
fn backoff_doubles_up_to_the_ceiling() {
    let backoff = Backoff {
        max_retries: 0,
        initial_delay_ms: 400,
        max_delay_secs: 1,
    };

    assert_eq!(backoff.first_delay_ms(), 400);
    assert_eq!(backoff.next_delay_ms(400), 800);
    assert_eq!(backoff.next_delay_ms(800), 1000);
    assert_eq!(backoff.next_delay_ms(1000), 1000);
}

#[test]
fn zero_backoff_still_waits() {
    let backoff = Backoff {
        max_retries: 0,
        initial_delay_ms: 0,
        max_delay_secs: 0,
    };

    assert!(backoff.first_delay_ms() > 0);
    assert!(backoff.next_delay_ms(0) > 0);
}

#[tokio::test(start_paused = true)]
async fn zero_delay_does_not_spin_on_connect_failures() {
    let made = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&made);
    let presence = WebSocketPresence::new(
        "ws://test",
        Backoff {
            max_retries: 0,
            initial_delay_ms: 0,
            max_delay_secs: 0,
        },
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let failing = MockTransport::new();
            failing.set_connect_fail(true);
            failing
        },
    );
    let (listener, _) = collector();

    let sub = presence.subscribe(Some("alice"), listener);
    for _ in 0..200 {
        tokio::task::yield_now().await;
    }

    // Without time passing only the first attempt can run
    assert_eq!(made.load(Ordering::SeqCst), 1);
    sub.cancel();
}
