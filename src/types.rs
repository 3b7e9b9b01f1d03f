//! Basic type definitions for the relay
//!
//! Provides newtype wrappers for type safety:
//! - `ClientId`: UUID-based unique connection identifier
//! - `RoomKey`: (room name, secret) pair identifying one isolated room

use std::fmt;

use uuid::Uuid;

/// Unique connection identifier (newtype pattern)
///
/// Wraps a UUID v4 for type-safe connection identification.
/// Implements Hash and Eq for use as HashMap keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Room identity derived from the join handshake
///
/// Two connections share a room iff both the name and the secret are equal.
/// The secret never leaves the process: `Debug` and `Display` redact it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RoomKey {
    name: String,
    secret: String,
}

impl RoomKey {
    pub fn new(name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret: secret.into(),
        }
    }

    /// Public room name (shared by every room with this name, whatever the secret)
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomKey")
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_unique() {
        let id1 = ClientId::new();
        let id2 = ClientId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_room_key_secret_distinguishes() {
        assert_eq!(RoomKey::new("lobby", "pw"), RoomKey::new("lobby", "pw"));
        assert_ne!(RoomKey::new("lobby", "pw"), RoomKey::new("lobby", "other"));
        assert_ne!(RoomKey::new("lobby", ""), RoomKey::new("lobby", "pw"));
    }

    #[test]
    fn test_room_key_never_prints_secret() {
        let key = RoomKey::new("lobby", "hunter2");
        assert!(!format!("{:?}", key).contains("hunter2"));
        assert_eq!(key.to_string(), "lobby");
    }
}
