//! Join handshake validation
//!
//! Membership is granted purely on knowledge of the (room name, secret)
//! pair; there is no external identity check.

use crate::error::AuthError;
use crate::message::{JoinRequest, SERVER_NAME};
use crate::types::RoomKey;

/// Validated handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub key: RoomKey,
}

/// Parse and validate a raw join frame
pub fn authenticate(raw_handshake: &str) -> Result<Credentials, AuthError> {
    let request: JoinRequest = serde_json::from_str(raw_handshake)
        .map_err(|e| AuthError::Malformed(e.to_string()))?;
    validate(request)
}

/// Validate an already decoded join request
pub fn validate(request: JoinRequest) -> Result<Credentials, AuthError> {
    let username = request.username.trim();
    let chatname = request.chatname.trim();

    if username.is_empty() {
        return Err(AuthError::EmptyUsername);
    }
    if chatname.is_empty() {
        return Err(AuthError::EmptyRoomName);
    }
    if username.eq_ignore_ascii_case(SERVER_NAME) {
        return Err(AuthError::ReservedUsername(username.to_string()));
    }

    Ok(Credentials {
        username: username.to_string(),
        key: RoomKey::new(chatname, request.password.trim()),
    })
}
