// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::future::Future;
use std::sync::Arc;

use cs_core::OnlineStatus;

use crate::config::Config;
use crate::coordinator::SyncCoordinator;
use crate::error::{Error, Result};
use crate::network::NetworkMonitor;
use crate::presence::PresenceChannel;
use crate::session::{SessionLock, Stack};
use crate::status::OnlineStatusContext;

use super::runtime;

/// One-line status summary for the log.
pub fn describe(status: &OnlineStatus) -> String {
    let state = if status.is_online { "online" } else { "offline" };
    if status.online_users.is_empty() {
        return format!("{}, nobody else here", state);
    }
    let users: Vec<&str> = status.online_users.iter().collect();
    let noun = if users.len() == 1 { "user" } else { "users" };
    format!("{}, {} {} online: {}", state, users.len(), noun, users.join(", "))
}

/// Hold a session open until `shutdown` resolves, logging status changes.
pub async fn session(
    monitor: &dyn NetworkMonitor,
    presence: &dyn PresenceChannel,
    coordinator: Arc<SyncCoordinator>,
    user: &str,
    shutdown: impl Future<Output = Result<()>>,
) -> Result<()> {
    let ctx = OnlineStatusContext::start(monitor, presence, Arc::clone(&coordinator), Some(user));
    let mut status = ctx.watch();
    tokio::pin!(shutdown);

    let result = loop {
        tokio::select! {
            result = &mut shutdown => break result,
            changed = status.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let current = status.borrow_and_update().clone();
                tracing::info!("status: {}", describe(&current));
            }
        }
    };

    ctx.stop();
    coordinator.wait_idle().await;
    let stats = coordinator.stats();
    tracing::info!(
        "session ended: {} syncs ({} ok, {} failed, {} coalesced)",
        stats.started,
        stats.succeeded,
        stats.failed,
        stats.coalesced
    );
    result
}

pub fn run(config: &Config, user: &str) -> Result<()> {
    let lock = SessionLock::acquire(config)?;
    tracing::debug!("holding {}", lock.path().display());
    let stack = Stack::open(config)?;

    runtime()?.block_on(async {
        stack.monitor.spawn();
        let result = session(
            stack.monitor.as_ref(),
            &stack.presence,
            Arc::clone(&stack.coordinator),
            user,
            async { tokio::signal::ctrl_c().await.map_err(Error::from) },
        )
        .await;
        stack.monitor.stop();
        result
    })
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
