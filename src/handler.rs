//! WebSocket connection handler
//!
//! Drives one connection through accept → authenticate → register →
//! read loop → deregister. Outbound envelopes flow through a bounded
//! queue drained by a dedicated writer task.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::error::{Error as WsError, ProtocolError as WsProtocolError};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, info, warn};

use crate::auth::{authenticate, Credentials};
use crate::broadcast::{broadcast, send_to};
use crate::client::ConnectionHandle;
use crate::command::{dispatch, Command, Flow};
use crate::config::RelayConfig;
use crate::error::{AppError, AuthError, CommandError};
use crate::message::{ClientMessage, Envelope};
use crate::registry::RoomRegistry;
use crate::types::ClientId;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsSource = SplitStream<WebSocketStream<TcpStream>>;

/// Result of waiting for the next inbound frame
enum Inbound {
    Frame(Message),
    Closed,
    Failed(WsError),
    Idle,
}

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake and the join handshake, then relays
/// until the client quits, disconnects, idles out or is evicted. The
/// leave path runs exactly once on every exit after a successful join.
pub async fn handle_connection(
    stream: TcpStream,
    registry: Arc<RoomRegistry>,
    config: Arc<RelayConfig>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // WebSocket handshake
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let client_id = ClientId::new();
    info!("Client {} connected from {}", client_id, peer_addr);

    // Join handshake
    let credentials = match timeout(config.handshake_timeout, read_join(&mut ws_receiver)).await {
        Ok(Ok(credentials)) => credentials,
        Ok(Err(AppError::Auth(e))) => {
            reject(&mut ws_sender, client_id, e).await;
            return Ok(());
        }
        Ok(Err(AppError::HandshakeClosed)) => {
            debug!("Client {} left before joining", client_id);
            return Ok(());
        }
        Ok(Err(e)) => return Err(e),
        Err(_) => {
            let _ = ws_sender.close().await;
            return Err(AppError::HandshakeTimeout);
        }
    };

    // Register into the room
    let (msg_tx, mut msg_rx) = mpsc::channel::<Envelope>(config.queue_capacity.max(1));
    let handle = ConnectionHandle::new(client_id, credentials.username.clone(), msg_tx);

    // Queued ahead of any room traffic; only written if the join succeeds
    send_to(
        &handle,
        Envelope::Joined {
            username: handle.username.clone(),
        },
    );
    let room = match registry.join(credentials.key.clone(), handle.clone()).await {
        Ok(room) => room,
        Err(e) => {
            reject(&mut ws_sender, client_id, e).await;
            return Ok(());
        }
    };

    broadcast(
        &room,
        &Envelope::JoinNotice {
            username: handle.username.clone(),
        },
        Some(client_id),
    )
    .await;

    // Spawn write task (Envelope -> WebSocket)
    let mut write_task = tokio::spawn(async move {
        while let Some(envelope) = msg_rx.recv().await {
            match serde_json::to_string(&envelope) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, ending write task");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize envelope: {}", e);
                }
            }
        }
        debug!("Write task ended for client");

        // Send close frame when done
        let _ = ws_sender.close().await;
    });
    let mut writer_done = false;

    // Read loop
    loop {
        let inbound = tokio::select! {
            inbound = next_inbound(&mut ws_receiver, config.idle_timeout) => inbound,
            _ = handle.evicted() => {
                warn!("Client {} evicted", client_id);
                break;
            }
            _ = &mut write_task => {
                writer_done = true;
                debug!("Write task completed for {}", client_id);
                break;
            }
        };

        match inbound {
            Inbound::Frame(Message::Text(text)) => match ClientMessage::decode(&text) {
                Ok(ClientMessage::Message { content }) => {
                    if dispatch(&room, &handle, Command::parse(&content)).await == Flow::Close {
                        debug!("Client {} quit", client_id);
                        break;
                    }
                }
                Ok(ClientMessage::Join {}) => {
                    send_to(&handle, CommandError::AlreadyJoined.into());
                }
                Err(e) => {
                    warn!("Invalid frame from {}: {}", client_id, e);
                    send_to(&handle, e.into());
                    break;
                }
            },
            Inbound::Frame(Message::Close(_)) | Inbound::Closed => {
                debug!("Client {} sent close frame", client_id);
                break;
            }
            Inbound::Frame(_) => {
                // Binary, ping and pong frames carry no envelopes
            }
            Inbound::Failed(e) => {
                error!("WebSocket error for {}: {}", client_id, e);
                break;
            }
            Inbound::Idle => {
                info!("Client {} idle, disconnecting", client_id);
                break;
            }
        }
    }

    // Deregister
    if let Some(departure) = registry.leave(&credentials.key, client_id).await {
        broadcast(
            &departure.room,
            &Envelope::LeaveNotice {
                username: departure.handle.username.clone(),
            },
            None,
        )
        .await;
    }
    drop(handle);
    drop(room);

    // Let the writer flush whatever is still queued, then give up on it
    if !writer_done && timeout(config.drain_timeout, &mut write_task).await.is_err() {
        debug!("Write task for {} did not drain in time", client_id);
        write_task.abort();
    }

    info!("Client {} disconnected", client_id);

    Ok(())
}

/// Wait for the first text frame and validate it as a join request
async fn read_join(ws_receiver: &mut WsSource) -> Result<Credentials, AppError> {
    while let Some(msg_result) = ws_receiver.next().await {
        match msg_result {
            Ok(Message::Text(text)) => return Ok(authenticate(&text)?),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            // Dropped without a close frame
            Err(WsError::ConnectionClosed)
            | Err(WsError::Protocol(WsProtocolError::ResetWithoutClosingHandshake)) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Err(AppError::HandshakeClosed)
}

async fn next_inbound(ws_receiver: &mut WsSource, idle: Option<Duration>) -> Inbound {
    let next = match idle {
        Some(limit) => match timeout(limit, ws_receiver.next()).await {
            Ok(next) => next,
            Err(_) => return Inbound::Idle,
        },
        None => ws_receiver.next().await,
    };
    match next {
        Some(Ok(msg)) => Inbound::Frame(msg),
        Some(Err(e)) => Inbound::Failed(e),
        None => Inbound::Closed,
    }
}

/// Tell the client why its join failed, then close
async fn reject(ws_sender: &mut WsSink, client_id: ClientId, err: AuthError) {
    warn!("Client {} rejected: {}", client_id, err);
    if let Ok(json) = serde_json::to_string(&Envelope::from(err)) {
        let _ = ws_sender.send(Message::Text(json.into())).await;
    }
    let _ = ws_sender.close().await;
}
