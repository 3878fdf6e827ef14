// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! chatsync - offline-first sync and presence for a chat client.
//!
//! This crate provides the functionality behind the `chatsync` CLI: a local
//! SQLite store whose changes are pushed to and pulled from a remote service
//! over WebSocket, plus the session-level online status shown to users.
//!
//! # Main Components
//!
//! - [`SyncCoordinator`] - decides when to sync (mount, reconnect, periodic, manual)
//!   and guarantees that at most one sync is in flight
//! - [`OnlineStatusContext`] - session-owned `{is_online, online_users}` that
//!   feeds the coordinator its reconnect triggers
//! - [`network::NetworkMonitor`] - connectivity events and polls
//! - [`presence::PresenceChannel`] - roster of other online users
//! - [`engine::SyncEngine`] - push/pull against the remote
//!
//! # Wiring a session
//!
//! ```rust,ignore
//! let stack = Stack::open(&config)?;
//! stack.monitor.spawn();
//! let ctx = OnlineStatusContext::start(
//!     stack.monitor.as_ref(),
//!     &stack.presence,
//!     Arc::clone(&stack.coordinator),
//!     Some("alice"),
//! );
//! let mut status = ctx.watch();
//! // ...
//! ctx.stop();
//! ```

mod cli;
mod commands;
mod logging;

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod network;
pub mod presence;
pub mod session;
pub mod status;
pub mod subscription;
pub mod transport;

#[cfg(test)]
mod test_helpers;

pub use cli::{Cli, Command, OutputFormat};
pub use config::Config;
pub use coordinator::{PeriodicCheck, SyncCoordinator, SyncStats, TriggerOutcome};
pub use error::{Error, Result};
pub use status::OnlineStatusContext;

/// Resolve configuration, install logging, and run `cli.command`.
pub fn run(cli: Cli) -> Result<()> {
    let config = Config::resolve(cli.config.as_deref())?;
    logging::setup_logging(cli.verbose, config.log.file.as_deref());
    dispatch(cli.command, &config)
}

fn dispatch(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Run { user } => commands::run::run(config, &user),
        Command::Sync { output } => commands::sync::run(config, output),
        Command::Pending { output } => commands::pending::run(config, output),
        Command::Probe { output } => commands::probe::run(config, output),
        Command::Record {
            table,
            record_id,
            payload,
            delete,
        } => commands::record::run(config, &table, &record_id, payload.as_deref(), delete),
        Command::Config => commands::config::run(config),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
