//! Message protocol definitions
//!
//! JSON-based bidirectional protocol. Inside the relay every server event is
//! an [`Envelope`]; it is turned into its wire shape ([`WireMessage`]) only
//! when serialized by the connection's writer task.

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, CommandError, ProtocolError};

/// Display name used for every server-originated chat line
pub const SERVER_NAME: &str = "Server";

/// Join handshake (first frame of every connection)
///
/// The `type` tag is optional: `{type:"join", ...}` and the bare
/// `{username, chatname, password}` shape are both accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinRequest {
    pub username: String,
    pub chatname: String,
    #[serde(default)]
    pub password: String,
}

/// Client → Server message after the handshake
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Repeated join (rejected once joined; fields are ignored)
    Join {},
    /// Chat text or `/`-command
    Message { content: String },
}

impl ClientMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Server event
///
/// Closed set of envelope kinds. Immutable once built: broadcast hands a
/// clone to each recipient queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "WireMessage")]
pub enum Envelope {
    /// Private confirmation of a completed join
    Joined { username: String },
    /// Someone entered the room
    JoinNotice { username: String },
    /// Someone left the room
    LeaveNotice { username: String },
    /// Chat line from a member
    Chat { username: String, content: String },
    /// Text from the server itself (help, banner, goodbye)
    ServerNotice { content: String },
    /// Private theme change
    ColourShift { color: String },
    /// Private error reply
    Error { code: ErrorCode, content: String },
    /// Handshake rejected
    AuthFailed { message: String },
}

impl Envelope {
    pub fn chat(username: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Chat {
            username: username.into(),
            content: content.into(),
        }
    }

    pub fn notice(content: impl Into<String>) -> Self {
        Self::ServerNotice {
            content: content.into(),
        }
    }
}

/// Error codes for `Envelope::Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Command token not recognised
    UnknownCommand,
    /// Join frame sent twice
    AlreadyJoined,
    /// Frame could not be decoded
    InvalidMessage,
}

/// Wire shape of server → client frames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireMessage {
    #[serde(rename = "join")]
    Join { username: String },
    #[serde(rename = "message")]
    Message { username: String, content: String },
    #[serde(rename = "colourshift")]
    ColourShift { color: String },
    #[serde(rename = "error")]
    Error { code: ErrorCode, content: String },
    #[serde(rename = "auth_failed")]
    AuthFailed { message: String },
}

impl From<Envelope> for WireMessage {
    fn from(envelope: Envelope) -> Self {
        match envelope {
            Envelope::Joined { username } => WireMessage::Join { username },
            Envelope::JoinNotice { username } => WireMessage::Message {
                username: SERVER_NAME.to_string(),
                content: format!("A wild {} has appeared.", username),
            },
            Envelope::LeaveNotice { username } => WireMessage::Message {
                username: SERVER_NAME.to_string(),
                content: format!("{} has left the chat.", username),
            },
            Envelope::Chat { username, content } => WireMessage::Message { username, content },
            Envelope::ServerNotice { content } => WireMessage::Message {
                username: SERVER_NAME.to_string(),
                content,
            },
            Envelope::ColourShift { color } => WireMessage::ColourShift { color },
            Envelope::Error { code, content } => WireMessage::Error { code, content },
            Envelope::AuthFailed { message } => WireMessage::AuthFailed { message },
        }
    }
}

impl From<AuthError> for Envelope {
    fn from(err: AuthError) -> Self {
        Envelope::AuthFailed {
            message: err.to_string(),
        }
    }
}

impl From<CommandError> for Envelope {
    fn from(err: CommandError) -> Self {
        let code = match &err {
            CommandError::Unknown(_) => ErrorCode::UnknownCommand,
            CommandError::AlreadyJoined => ErrorCode::AlreadyJoined,
        };
        Envelope::Error {
            code,
            content: err.to_string(),
        }
    }
}

impl From<ProtocolError> for Envelope {
    fn from(err: ProtocolError) -> Self {
        Envelope::Error {
            code: ErrorCode::InvalidMessage,
            content: err.to_string(),
        }
    }
}
