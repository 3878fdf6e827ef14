// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "chatsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first chat sync: keeps a local database in step with the server")]
#[command(
    long_about = "Offline-first chat sync.\n\n\
    Local changes are recorded in a SQLite database and pushed when online. \
    A running session syncs on start, on every reconnect, and periodically \
    while changes are pending, and tracks who else is online."
)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a session: sync, track connectivity and presence until Ctrl-C
    #[command(after_help = "\
Examples:
  chatsync run --user alice          Start a session as alice
  chatsync run --user alice -v       Same, with debug logging")]
    Run {
        /// User id to announce for presence
        #[arg(long, short, value_parser = non_empty_string)]
        user: String,
    },

    /// Run one sync now and print what moved
    Sync {
        /// Output format
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show local changes waiting to be pushed
    Pending {
        /// Output format
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Check connectivity once
    Probe {
        /// Output format
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Record a local change to be synced
    #[command(after_help = "\
Examples:
  chatsync record messages m1 '{\"body\":\"hi\"}'   Upsert a message
  chatsync record messages m1 --delete            Delete it")]
    Record {
        /// Table the record belongs to
        #[arg(value_parser = non_empty_string)]
        table: String,

        /// Record id within the table
        #[arg(value_parser = non_empty_string)]
        record_id: String,

        /// New record payload as JSON
        #[arg(required_unless_present = "delete")]
        payload: Option<String>,

        /// Delete the record instead
        #[arg(long, conflicts_with = "payload")]
        delete: bool,
    },

    /// Print the effective configuration
    Config,
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
