// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Wiring of the production stack from [`Config`].

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::coordinator::SyncCoordinator;
use crate::engine::{LocalStore, RemoteSyncEngine};
use crate::error::{Error, Result};
use crate::network::ProbeMonitor;
use crate::presence::WebSocketPresence;
use crate::transport::WebSocketTransport;

/// Everything a session needs, built but not yet started.
pub struct Stack {
    pub store: Arc<LocalStore>,
    pub monitor: Arc<ProbeMonitor>,
    pub coordinator: Arc<SyncCoordinator>,
    pub presence: WebSocketPresence<WebSocketTransport>,
}

impl Stack {
    /// Open the local store and assemble the engine, monitor, and coordinator.
    ///
    /// No connection is attempted until a sync runs or presence subscribes.
    pub fn open(config: &Config) -> Result<Self> {
        let db_path = config.database_path();
        let store = Arc::new(LocalStore::open(&db_path)?);
        tracing::debug!("opened store at {}", db_path.display());

        let engine = RemoteSyncEngine::new(
            config.remote.url.clone(),
            Arc::clone(&store),
            WebSocketTransport::new(),
            config.request_timeout(),
        );
        let monitor = Arc::new(ProbeMonitor::new(config.probe()));
        let coordinator = SyncCoordinator::new(
            Arc::new(engine),
            monitor.clone(),
            config.sync_interval(),
        );
        let presence = WebSocketPresence::new(
            config.remote.url.clone(),
            config.backoff(),
            WebSocketTransport::new,
        );

        Ok(Stack {
            store,
            monitor,
            coordinator,
            presence,
        })
    }
}

/// Exclusive lock on the database; released on drop.
pub struct SessionLock {
    _file: File,
    path: PathBuf,
}

impl SessionLock {
    /// Take the lock next to the configured database, failing fast if held.
    pub fn acquire(config: &Config) -> Result<Self> {
        let path = config.lock_path();
        let file = acquire_lock(&path)
            .map_err(|_| Error::SessionLocked(config.database_path().display().to_string()))?;
        Ok(SessionLock { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn acquire_lock(lock_path: &Path) -> std::io::Result<File> {
    use fs2::FileExt;

    if let Some(parent) = lock_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)?;

    // Non-blocking; a held lock means another session owns the database
    file.try_lock_exclusive()?;
    Ok(file)
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
