//! Wire protocol definitions
//!
//! Every frame is a JSON envelope `{"event": <name>, "data": <payload>}`.
//! Serde's adjacently tagged enums map event names onto variants.

use serde::{Deserialize, Serialize};

/// Client → Server event
#[derive(Debug, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Bind a display name to this connection
    #[serde(rename = "connection name")]
    ConnectionName { name: String },
    /// Room-wide broadcast text
    #[serde(rename = "message")]
    Message(String),
    /// Directed text for a single named user
    #[serde(rename = "private message")]
    PrivateMessage { to: String, txt: String },
}

/// Server → Client event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Someone else bound a name: `"<name> has joined."`
    #[serde(rename = "new user")]
    NewUser(String),
    /// Broadcast text, echoed to the sender as well
    #[serde(rename = "message")]
    Message(String),
    /// Private text; `from` is omitted when the sender never named itself
    #[serde(rename = "private message")]
    PrivateMessage {
        txt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<String>,
    },
}

impl ServerEvent {
    /// Build the join announcement for a newly named user
    pub fn joined(name: &str) -> Self {
        ServerEvent::NewUser(format!("{} has joined.", name))
    }

    /// Event name as it appears on the wire
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerEvent::NewUser(_) => "new user",
            ServerEvent::Message(_) => "message",
            ServerEvent::PrivateMessage { .. } => "private message",
        }
    }
}
