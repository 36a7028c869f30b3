//! WebSocket Chat Relay Library
//!
//! A single-room chat server over WebSocket. Clients bind a display name,
//! then exchange room-wide broadcasts and private messages.
//!
//! # Protocol
//! Each text frame is a JSON envelope `{"event": ..., "data": ...}`:
//! - `connection name` `{name}`: bind a name; everyone else gets `new user`
//! - `message` `"text"`: echoed to every connected session, sender included
//! - `private message` `{to, txt}`: delivered as `{txt, from}` to `to` only
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` owns the `UserRegistry` and runs routing
//! - Each connection has a `handler` task communicating with the server
//! - No locks needed - all registry access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use chat_relay::{serve, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::default();
//!     let listener = TcpListener::bind(&config.addr).await.unwrap();
//!     serve(listener, config).await;
//! }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod router;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use config::Config;
pub use error::{AppError, SendError};
pub use handler::{handle_connection, serve};
pub use message::{ClientEvent, ServerEvent};
pub use registry::{BindOutcome, UserRegistry};
pub use server::{ChatServer, ServerCommand};
pub use session::{ConnectionHandle, Session};
pub use types::SessionId;
