// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Presence over the remote service's WebSocket.
//!
//! Each subscription owns a background task that connects, joins under the
//! user's id and forwards every roster it receives. When the connection drops
//! the task reconnects with exponential backoff until it is cancelled or
//! runs out of attempts. Failures only ever leave the last roster in place.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use cs_core::protocol::{ClientMessage, ServerMessage};
use cs_core::PresenceRoster;

use super::PresenceChannel;
use crate::subscription::{Listener, Subscription};
use crate::transport::{Transport, TransportError};

/// Reconnection policy for long-lived connections.
#[derive(Debug, Clone)]
pub struct Backoff {
    /// Maximum consecutive failed attempts (0 = unlimited).
    pub max_retries: u32,
    /// Initial delay for exponential backoff (milliseconds).
    pub initial_delay_ms: u64,
    /// Maximum delay between reconnection attempts (seconds).
    pub max_delay_secs: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff {
            max_retries: 0,
            initial_delay_ms: 100,
            max_delay_secs: 30,
        }
    }
}

/// Floor under every reconnect delay.
const MIN_DELAY_MS: u64 = 10;

impl Backoff {
    fn ceiling_ms(&self) -> u64 {
        self.max_delay_secs.saturating_mul(1000).max(MIN_DELAY_MS)
    }

    /// Delay before the first retry.
    pub fn first_delay_ms(&self) -> u64 {
        self.initial_delay_ms.clamp(MIN_DELAY_MS, self.ceiling_ms())
    }

    /// Delay after one that lasted `current_ms`.
    pub fn next_delay_ms(&self, current_ms: u64) -> u64 {
        current_ms
            .saturating_mul(2)
            .clamp(MIN_DELAY_MS, self.ceiling_ms())
    }
}

/// Factory producing a fresh transport for each connection attempt.
type TransportFactory<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// [`PresenceChannel`] backed by a WebSocket-like [`Transport`].
pub struct WebSocketPresence<T: Transport> {
    url: String,
    backoff: Backoff,
    new_transport: TransportFactory<T>,
}

impl<T: Transport + 'static> WebSocketPresence<T> {
    pub fn new(
        url: impl Into<String>,
        backoff: Backoff,
        new_transport: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        WebSocketPresence {
            url: url.into(),
            backoff,
            new_transport: Arc::new(new_transport),
        }
    }
}

impl<T: Transport + 'static> PresenceChannel for WebSocketPresence<T> {
    fn subscribe(&self, identity: Option<&str>, listener: Listener<PresenceRoster>) -> Subscription {
        let Some(user_id) = identity else {
            tracing::debug!("no identity yet, presence not subscribed");
            return Subscription::noop();
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("presence subscribe called outside a tokio runtime");
            return Subscription::noop();
        };

        let cancel = CancellationToken::new();
        let session = PresenceSession {
            url: self.url.clone(),
            user_id: user_id.to_string(),
            backoff: self.backoff.clone(),
            new_transport: Arc::clone(&self.new_transport),
            listener,
            cancel: cancel.clone(),
        };
        runtime.spawn(session.run());

        Subscription::new(move || cancel.cancel())
    }
}

/// How one connected stretch ended.
enum Ended {
    Cancelled,
    Closed,
    Failed(TransportError),
}

/// State owned by one subscription's background task.
struct PresenceSession<T: Transport> {
    url: String,
    user_id: String,
    backoff: Backoff,
    new_transport: TransportFactory<T>,
    listener: Listener<PresenceRoster>,
    cancel: CancellationToken,
}

impl<T: Transport> PresenceSession<T> {
    async fn run(self) {
        let mut failures = 0u32;
        let mut delay_ms = self.backoff.first_delay_ms();

        loop {
            if self.cancel.is_cancelled() {
                return;
            }

            let mut transport = (self.new_transport)();
            let connected = tokio::select! {
                _ = self.cancel.cancelled() => return,
                result = transport.connect(&self.url) => result,
            };

            match connected {
                Ok(()) => {
                    failures = 0;
                    delay_ms = self.backoff.first_delay_ms();
                    tracing::info!("presence connected as {}", self.user_id);

                    match self.stream_rosters(&mut transport).await {
                        Ended::Cancelled => {
                            let _ = transport.send(ClientMessage::leave()).await;
                            let _ = transport.disconnect().await;
                            return;
                        }
                        Ended::Closed => tracing::info!("presence connection closed"),
                        Ended::Failed(e) => tracing::warn!("presence connection lost: {}", e),
                    }
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    tracing::warn!("presence connect attempt {} failed: {}", failures, e);
                    if self.backoff.max_retries > 0 && failures >= self.backoff.max_retries {
                        tracing::warn!("presence giving up after {} attempts", failures);
                        return;
                    }
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
            }
            delay_ms = self.backoff.next_delay_ms(delay_ms);
        }
    }

    /// Join, then forward rosters until the connection ends or we are cancelled.
    async fn stream_rosters(&self, transport: &mut T) -> Ended {
        if let Err(e) = transport.send(ClientMessage::join(&self.user_id)).await {
            return Ended::Failed(e);
        }

        loop {
            let received = tokio::select! {
                _ = self.cancel.cancelled() => return Ended::Cancelled,
                received = transport.recv() => received,
            };

            match received {
                Ok(Some(ServerMessage::Roster { users })) => {
                    // A cancelled subscription must not deliver anything
                    if self.cancel.is_cancelled() {
                        return Ended::Cancelled;
                    }
                    (self.listener)(PresenceRoster::from(users));
                }
                Ok(Some(ServerMessage::Error { message })) => {
                    tracing::warn!("presence server error: {}", message);
                }
                Ok(Some(_)) => continue,
                Ok(None) => return Ended::Closed,
                Err(e) => return Ended::Failed(e),
            }
        }
    }
}

#[cfg(test)]
#[path = "websocket_tests.rs"]
mod tests;
