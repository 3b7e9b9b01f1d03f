//! Error types for the relay
//!
//! Every error is scoped to one connection or one room; none is fatal to
//! the process. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Connection-level errors
///
/// Any of these ends the connection that raised it.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Client never completed the join handshake
    #[error("Handshake timed out")]
    HandshakeTimeout,

    /// Client closed the socket before sending a join request
    #[error("Connection closed during handshake")]
    HandshakeClosed,

    /// Join handshake rejected
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Join handshake rejections
///
/// The connection is closed without ever joining a room, so no
/// other client observes anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Handshake frame missing a field or not JSON
    #[error("Malformed join request: {0}")]
    Malformed(String),

    #[error("Username is required")]
    EmptyUsername,

    #[error("Chat name is required")]
    EmptyRoomName,

    /// Reserved for server notices
    #[error("Username '{0}' is not allowed")]
    ReservedUsername(String),

    /// Another current member of the room already uses this name
    #[error("Username '{0}' is already taken in this room")]
    NameTaken(String),
}

/// Undecodable frame after a successful join
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid message format: {0}")]
    InvalidFrame(#[from] serde_json::Error),
}

/// Enqueue failure towards one recipient
///
/// The recipient is marked for disconnection; other recipients are unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Outbound queue is full (recipient too slow)
    #[error("Outbound queue full")]
    QueueFull,

    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    Closed,
}

/// Command failures, answered privately to the issuer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    /// A second join frame on an already joined connection
    #[error("Already joined a room")]
    AlreadyJoined,
}
