//! Error types for the chat relay
//!
//! Defines application-level errors and connection send errors.

use thiserror::Error;

/// Application-level errors
///
/// Transport errors end a single connection. Routing errors are logged
/// by the server actor and never reach the client.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal for the connection)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Connection never completed the WebSocket upgrade
    #[error("Handshake timed out")]
    HandshakeTimeout,

    /// Channel send error (internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// Display name rejected on bind
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Private message addressed to a name nobody holds
    #[error("Unknown recipient: {0}")]
    UnknownRecipient(String),

    /// Session is not (or no longer) registered
    #[error("Unknown session")]
    UnknownSession,
}

/// Connection send errors
#[derive(Debug, Error)]
pub enum SendError {
    /// The connection's writer has gone away
    #[error("Channel closed")]
    ChannelClosed,
}
