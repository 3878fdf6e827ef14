// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages for client-server communication.
//!
//! One connection carries two independent conversations:
//! - Presence: the client joins under its user id and the server pushes the
//!   full roster whenever it changes
//! - Sync: the client pushes queued changes and pulls remote changes since
//!   its last cursor

use serde::{Deserialize, Serialize};

use crate::change::Change;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Announce presence under the given user id.
    ///
    /// The server answers with a roster and keeps pushing rosters.
    Join { user_id: String },

    /// Withdraw presence before closing the connection.
    Leave,

    /// Push local changes.
    ///
    /// The server answers with `PushAck` listing the ids it stored.
    Push { changes: Vec<Change> },

    /// Request remote changes after the given cursor.
    Pull {
        /// Server cursor from the last `PullResponse` (0 = from the start).
        since: u64,
    },

    /// Ping message for keepalive.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full set of user ids currently present.
    Roster { users: Vec<String> },

    /// Response to a Push request.
    PushAck {
        /// Ids of the changes the server accepted (including duplicates).
        accepted: Vec<String>,
    },

    /// Response to a Pull request.
    PullResponse {
        /// Changes after the requested cursor, in server order.
        changes: Vec<Change>,
        /// Cursor to send with the next Pull.
        cursor: u64,
    },

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// Error message.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Creates a Join message.
    pub fn join(user_id: impl Into<String>) -> Self {
        ClientMessage::Join {
            user_id: user_id.into(),
        }
    }

    /// Creates a Leave message.
    pub fn leave() -> Self {
        ClientMessage::Leave
    }

    /// Creates a Push message.
    pub fn push(changes: Vec<Change>) -> Self {
        ClientMessage::Push { changes }
    }

    /// Creates a Pull message.
    pub fn pull(since: u64) -> Self {
        ClientMessage::Pull { since }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates a Roster message.
    pub fn roster<S: Into<String>>(users: impl IntoIterator<Item = S>) -> Self {
        ServerMessage::Roster {
            users: users.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a PushAck message.
    pub fn push_ack(accepted: Vec<String>) -> Self {
        ServerMessage::PushAck { accepted }
    }

    /// Creates a PullResponse message.
    pub fn pull_response(changes: Vec<Change>, cursor: u64) -> Self {
        ServerMessage::PullResponse { changes, cursor }
    }

    /// Creates a Pong message.
    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
