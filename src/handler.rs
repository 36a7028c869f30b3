//! WebSocket connection handling
//!
//! Accepts TCP connections, performs the WebSocket handshake and pumps
//! frames between the socket and the ChatServer actor.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::message::ClientEvent;
use crate::registry::UserRegistry;
use crate::server::{ChatServer, ServerCommand};
use crate::session::ConnectionHandle;
use crate::types::SessionId;

/// Start the ChatServer actor and accept connections forever
pub async fn serve(listener: TcpListener, config: Config) {
    let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer);
    let server = ChatServer::new(UserRegistry::new(config.max_name_len), cmd_rx);
    tokio::spawn(server.run());

    info!("ChatServer actor started");

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();
                let handshake_timeout = config.handshake_timeout;

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, cmd_tx, handshake_timeout).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// Handle a new TCP connection
///
/// The session is registered before the handshake response goes out, so a
/// client whose handshake has completed is already in the broadcast set.
/// A connection that has not upgraded within `handshake_timeout` is
/// unregistered and dropped.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
    handshake_timeout: Duration,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // Register with ChatServer
    let (handle, mut event_rx) = ConnectionHandle::channel();
    let (respond_to, id_rx) = oneshot::channel();
    cmd_tx
        .send(ServerCommand::Connect { handle, respond_to })
        .await
        .map_err(|_| AppError::ChannelSend)?;
    let session_id = id_rx.await.map_err(|_| AppError::ChannelSend)?;

    // WebSocket handshake
    let ws_stream = match timeout(handshake_timeout, tokio_tungstenite::accept_async(stream)).await {
        Ok(Ok(ws_stream)) => ws_stream,
        Ok(Err(e)) => {
            let _ = cmd_tx.send(ServerCommand::Disconnect { session_id }).await;
            return Err(e.into());
        }
        Err(_) => {
            warn!("Session {} did not complete handshake from {}", session_id, peer_addr);
            let _ = cmd_tx.send(ServerCommand::Disconnect { session_id }).await;
            return Err(AppError::HandshakeTimeout);
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    info!("Session {} connected from {}", session_id, peer_addr);

    let cmd_tx_read = cmd_tx.clone();

    // Read task (WebSocket -> ServerCommand)
    let mut read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => {
                        let cmd = client_event_to_command(session_id, event);
                        if cmd_tx_read.send(cmd).await.is_err() {
                            debug!("Server closed, ending read task for {}", session_id);
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Ignoring malformed event from {}: {}", session_id, e);
                    }
                },
                Ok(Message::Close(_)) => {
                    debug!("Session {} sent close frame", session_id);
                    break;
                }
                Ok(_) => {
                    // Ping/Pong are answered by tungstenite; binary frames are not part of the protocol
                }
                Err(e) => {
                    error!("WebSocket error for {}: {}", session_id, e);
                    break;
                }
            }
        }
        debug!("Read task ended for {}", session_id);
    });

    // Write task (ServerEvent -> WebSocket)
    let mut write_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json)).await.is_err() {
                        debug!("WebSocket send failed, ending write task for {}", session_id);
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize event: {}", e);
                }
            }
        }
        debug!("Write task ended for {}", session_id);

        let _ = ws_sender.close().await;
    });

    // Whichever half finishes first takes the other down with it
    tokio::select! {
        _ = &mut read_task => {
            debug!("Read task completed for {}", session_id);
            write_task.abort();
        }
        _ = &mut write_task => {
            debug!("Write task completed for {}", session_id);
            read_task.abort();
        }
    }

    let _ = cmd_tx
        .send(ServerCommand::Disconnect { session_id })
        .await;

    info!("Session {} disconnected", session_id);

    Ok(())
}

/// Convert a ClientEvent to a ServerCommand
fn client_event_to_command(session_id: SessionId, event: ClientEvent) -> ServerCommand {
    match event {
        ClientEvent::ConnectionName { name } => ServerCommand::ConnectionName { session_id, name },
        ClientEvent::Message(text) => ServerCommand::Message { session_id, text },
        ClientEvent::PrivateMessage { to, txt } => ServerCommand::PrivateMessage {
            session_id,
            to,
            txt,
        },
    }
}
