//! Connection handle and session state
//!
//! A `Session` is the server-side view of one live connection, spanning
//! its unnamed and named phases.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::ServerEvent;
use crate::types::SessionId;

/// Outbound side of one live connection
///
/// Wraps the unbounded queue drained by the connection's writer task, so
/// `send` never blocks the caller. Cloning yields another handle to the same
/// connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self { sender }
    }

    /// Create a handle together with the receiver its writer drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Queue an event for this connection
    ///
    /// Returns an error if the writer has already gone away.
    pub fn send(&self, event: ServerEvent) -> Result<(), SendError> {
        self.sender
            .send(event)
            .map_err(|_| SendError::ChannelClosed)
    }
}

/// Connected session
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique identifier for this session
    pub id: SessionId,
    /// Position in connection order
    pub seq: u64,
    /// Display name (None until bound)
    pub name: Option<String>,
    /// Server → Client channel
    pub handle: ConnectionHandle,
}

impl Session {
    pub fn new(id: SessionId, seq: u64, handle: ConnectionHandle) -> Self {
        Self {
            id,
            seq,
            name: None,
            handle,
        }
    }

    /// Send an event to this session
    pub fn send(&self, event: ServerEvent) -> Result<(), SendError> {
        self.handle.send(event)
    }

    /// Name used in logs, "unnamed" before binding
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// Check if this session has bound a name
    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }
}
