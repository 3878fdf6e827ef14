// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Message transport to the remote chat service.
//!
//! The presence channel and the sync engine each own one [`Transport`] and
//! speak [`cs_core::protocol`] over it. Production code uses
//! [`WebSocketTransport`]; tests substitute a scripted mock.

use futures_util::future::BoxFuture;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use cs_core::protocol::{ClientMessage, ServerMessage};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("cannot reach {url}: {reason}")]
    Connect { url: String, reason: String },

    /// No connection, or the peer went away mid-operation.
    #[error("connection closed")]
    Closed,

    #[error("send failed: {0}")]
    Send(String),

    #[error("receive failed: {0}")]
    Receive(String),

    #[error("cannot encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// A bidirectional, message-framed connection.
pub trait Transport: Send + Sync {
    fn connect(&mut self, url: &str) -> BoxFuture<'_, TransportResult<()>>;

    /// Close the connection. Never fails when already closed.
    fn disconnect(&mut self) -> BoxFuture<'_, TransportResult<()>>;

    fn send(&mut self, msg: ClientMessage) -> BoxFuture<'_, TransportResult<()>>;

    /// Next protocol message, or `None` once the peer has closed.
    fn recv(&mut self) -> BoxFuture<'_, TransportResult<Option<ServerMessage>>>;

    fn is_connected(&self) -> bool;
}

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

struct Connection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

/// [`Transport`] over tokio-tungstenite.
#[derive(Default)]
pub struct WebSocketTransport {
    conn: Option<Connection>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        WebSocketTransport { conn: None }
    }

    /// Forget a connection that can no longer be used and pass `err` on.
    fn broken(&mut self, err: TransportError) -> TransportError {
        self.conn = None;
        err
    }
}

/// Decode one text frame. Frames this client does not understand are
/// skipped so a newer server can add message types.
fn decode(text: &str) -> Option<ServerMessage> {
    match ServerMessage::from_json(text) {
        Ok(msg) => Some(msg),
        Err(e) => {
            tracing::warn!("skipping unreadable frame: {}", e);
            None
        }
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, url: &str) -> BoxFuture<'_, TransportResult<()>> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws, _) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::Connect {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
            let (sink, stream) = ws.split();
            self.conn = Some(Connection { sink, stream });
            tracing::debug!("connected to {}", url);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            if let Some(mut conn) = self.conn.take() {
                // The peer may already be gone
                let _ = conn.sink.close().await;
            }
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            let json = msg.to_json()?;
            let conn = self.conn.as_mut().ok_or(TransportError::Closed)?;

            // Flushing surfaces a dead socket on this send, not the next one
            let sent = match conn.sink.send(Message::Text(json.into())).await {
                Ok(()) => conn.sink.flush().await,
                Err(e) => Err(e),
            };
            sent.map_err(|e| self.broken(TransportError::Send(e.to_string())))
        })
    }

    fn recv(&mut self) -> BoxFuture<'_, TransportResult<Option<ServerMessage>>> {
        Box::pin(async move {
            let conn = self.conn.as_mut().ok_or(TransportError::Closed)?;

            loop {
                let frame = match conn.stream.next().await {
                    Some(Ok(frame)) => frame,
                    Some(Err(e)) => {
                        return Err(self.broken(TransportError::Receive(e.to_string())))
                    }
                    None => {
                        self.conn = None;
                        return Ok(None);
                    }
                };
                match frame {
                    Message::Text(text) => {
                        if let Some(msg) = decode(&text) {
                            return Ok(Some(msg));
                        }
                    }
                    Message::Close(_) => {
                        self.conn = None;
                        return Ok(None);
                    }
                    // tungstenite answers pings itself; binary is not part of the protocol
                    _ => {}
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some()
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
