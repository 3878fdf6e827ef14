// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push/pull sync over a [`Transport`].

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::Mutex;
use tokio::time::Instant;

use cs_core::protocol::{ClientMessage, ServerMessage};
use cs_core::SyncReport;

use super::{EngineError, LocalStore, SyncEngine};
use crate::transport::Transport;

/// Sync engine that pushes the local outbox and pulls remote changes.
///
/// The transport sits behind an async mutex, so concurrent calls to
/// [`SyncEngine::sync`] run one after another rather than interleaving
/// requests on the same connection.
pub struct RemoteSyncEngine<T: Transport> {
    url: String,
    store: Arc<LocalStore>,
    transport: Mutex<T>,
    request_timeout: Duration,
}

impl<T: Transport> RemoteSyncEngine<T> {
    pub fn new(
        url: impl Into<String>,
        store: Arc<LocalStore>,
        transport: T,
        request_timeout: Duration,
    ) -> Self {
        RemoteSyncEngine {
            url: url.into(),
            store,
            transport: Mutex::new(transport),
            request_timeout,
        }
    }

    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    async fn run_cycle(&self, transport: &mut T) -> Result<SyncReport, EngineError> {
        if !transport.is_connected() {
            transport.connect(&self.url).await?;
            tracing::debug!("sync connected to {}", self.url);
        }

        let pushed = self.push(transport).await?;
        let pulled = self.pull(transport).await?;
        Ok(SyncReport { pushed, pulled })
    }

    async fn push(&self, transport: &mut T) -> Result<usize, EngineError> {
        let changes = self.store.pending()?;
        if changes.is_empty() {
            return Ok(0);
        }

        tracing::debug!("pushing {} changes", changes.len());
        transport.send(ClientMessage::push(changes)).await?;
        let accepted = self
            .await_reply(transport, "push_ack", |msg| match msg {
                ServerMessage::PushAck { accepted } => Ok(accepted),
                other => Err(other),
            })
            .await?;

        Ok(self.store.acknowledge(&accepted)?)
    }

    async fn pull(&self, transport: &mut T) -> Result<usize, EngineError> {
        let since = self.store.cursor()?;
        transport.send(ClientMessage::pull(since)).await?;
        let (changes, cursor) = self
            .await_reply(transport, "pull_response", |msg| match msg {
                ServerMessage::PullResponse { changes, cursor } => Ok((changes, cursor)),
                other => Err(other),
            })
            .await?;

        let applied = self.store.apply_remote(&changes)?;
        self.store.set_cursor(cursor)?;
        tracing::debug!(
            "pulled {} changes ({} applied), cursor {} -> {}",
            changes.len(),
            applied,
            since,
            cursor
        );
        Ok(applied)
    }

    /// Receive until `extract` accepts a message, skipping unrelated traffic.
    async fn await_reply<R>(
        &self,
        transport: &mut T,
        waiting_for: &'static str,
        extract: impl Fn(ServerMessage) -> Result<R, ServerMessage>,
    ) -> Result<R, EngineError> {
        let deadline = Instant::now() + self.request_timeout;
        loop {
            let received = tokio::time::timeout_at(deadline, transport.recv())
                .await
                .map_err(|_| EngineError::Timeout {
                    waiting_for,
                    after_ms: u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX),
                })??;

            match received {
                None => return Err(EngineError::ConnectionClosed),
                Some(ServerMessage::Error { message }) => return Err(EngineError::Rejected(message)),
                Some(msg) => match extract(msg) {
                    Ok(reply) => return Ok(reply),
                    Err(skipped) => {
                        tracing::trace!("skipping {:?} while waiting for {}", skipped, waiting_for)
                    }
                },
            }
        }
    }
}

impl<T: Transport> SyncEngine for RemoteSyncEngine<T> {
    fn sync(&self) -> BoxFuture<'_, Result<SyncReport, EngineError>> {
        Box::pin(async move {
            let mut transport = self.transport.lock().await;
            let result = self.run_cycle(&mut transport).await;

            if let Err(e) = &result {
                if e.breaks_connection() && transport.is_connected() {
                    let _ = transport.disconnect().await;
                }
            }
            result
        })
    }

    fn has_unsynced_changes(&self) -> BoxFuture<'_, Result<bool, EngineError>> {
        Box::pin(async move { Ok(self.store.pending_count()? > 0) })
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
