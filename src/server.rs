//! ChatServer Actor implementation
//!
//! The central actor owning the user registry. Connection handlers talk to
//! it only through `ServerCommand`s, so registry mutations never interleave.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::registry::{BindOutcome, UserRegistry};
use crate::router;
use crate::session::ConnectionHandle;
use crate::types::SessionId;

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New connection accepted; the assigned ID is sent back on `respond_to`
    Connect {
        handle: ConnectionHandle,
        respond_to: oneshot::Sender<SessionId>,
    },
    /// Connection closed
    Disconnect {
        session_id: SessionId,
    },
    /// Bind a display name
    ConnectionName {
        session_id: SessionId,
        name: String,
    },
    /// Room-wide broadcast
    Message {
        session_id: SessionId,
        text: String,
    },
    /// Directed message to one named user
    PrivateMessage {
        session_id: SessionId,
        to: String,
        txt: String,
    },
}

/// The main ChatServer actor
pub struct ChatServer {
    registry: UserRegistry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given registry and command receiver
    pub fn new(registry: UserRegistry, receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self { registry, receiver }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { handle, respond_to } => {
                self.handle_connect(handle, respond_to);
            }
            ServerCommand::Disconnect { session_id } => {
                self.handle_disconnect(session_id);
            }
            ServerCommand::ConnectionName { session_id, name } => {
                self.handle_connection_name(session_id, name);
            }
            ServerCommand::Message { session_id, text } => {
                self.handle_message(session_id, text);
            }
            ServerCommand::PrivateMessage {
                session_id,
                to,
                txt,
            } => {
                self.handle_private_message(session_id, to, txt);
            }
        }
    }

    /// Handle new connection
    fn handle_connect(&mut self, handle: ConnectionHandle, respond_to: oneshot::Sender<SessionId>) {
        let session_id = self.registry.register(handle);

        if respond_to.send(session_id).is_err() {
            // Handler gave up before learning its ID; nobody will disconnect it
            debug!("Handler for session {} went away during connect", session_id);
            self.registry.unregister(session_id);
            return;
        }

        info!("Session {} connected", session_id);
        debug!(
            "Total sessions: {}, named: {}",
            self.registry.len(),
            self.registry.named_count()
        );
    }

    /// Handle disconnection
    fn handle_disconnect(&mut self, session_id: SessionId) {
        match self.registry.unregister(session_id) {
            Some(session) if session.is_named() => {
                info!(
                    "Session {} ({}) disconnected",
                    session_id,
                    session.display_name()
                );
            }
            Some(_) => {
                info!("Session {} disconnected before naming itself", session_id);
            }
            None => {
                debug!("Duplicate disconnect for session {}", session_id);
            }
        }

        debug!(
            "Total sessions: {}, named: {}",
            self.registry.len(),
            self.registry.named_count()
        );
    }

    /// Handle name binding
    fn handle_connection_name(&mut self, session_id: SessionId, name: String) {
        match self.registry.bind(session_id, name.clone()) {
            Ok(BindOutcome::Joined) => {
                info!("Session {} joined as '{}'", session_id, name);
                let delivered = router::announce_join(&self.registry, session_id, &name);
                debug!("Join of '{}' announced to {} sessions", name, delivered);
            }
            Ok(BindOutcome::Renamed { previous }) => {
                info!(
                    "Session {} renamed from '{}' to '{}'",
                    session_id, previous, name
                );
            }
            Err(AppError::UnknownSession) => {
                debug!("Ignoring name for unknown session {}", session_id);
            }
            Err(e) => {
                warn!("Rejected name from session {}: {}", session_id, e);
            }
        }
    }

    /// Handle room broadcast
    fn handle_message(&mut self, session_id: SessionId, text: String) {
        let Some(sender) = self.registry.get(session_id) else {
            debug!("Ignoring message from unknown session {}", session_id);
            return;
        };

        debug!("Broadcast from {} ({})", session_id, sender.display_name());
        let delivered = router::broadcast(&self.registry, &text);
        debug!("Broadcast delivered to {} sessions", delivered);
    }

    /// Handle private message
    fn handle_private_message(&mut self, session_id: SessionId, to: String, txt: String) {
        if self.registry.get(session_id).is_none() {
            debug!("Ignoring private message from unknown session {}", session_id);
            return;
        }

        match router::private_message(&self.registry, session_id, &to, txt) {
            Ok(()) => debug!("Private message from {} delivered to '{}'", session_id, to),
            Err(e) => debug!("Private message from {} dropped: {}", session_id, e),
        }
    }
}
