//! Room state definition
//!
//! One room's membership behind its own lock. Unrelated rooms never
//! contend with each other.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, MutexGuard};

use crate::client::ConnectionHandle;
use crate::types::{ClientId, RoomKey};

/// Why a handle could not be added
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddError {
    /// Another current member already uses the name
    NameTaken,
    /// The room emptied and is being discarded; retry on a fresh room
    Closed,
}

/// Chat room
///
/// Holds the current members keyed by connection id. A room that reaches
/// zero members is closed for good: it never accepts members again and
/// the registry drops it.
#[derive(Debug)]
pub struct RoomState {
    /// Room identity
    pub key: RoomKey,
    members: Mutex<HashMap<ClientId, ConnectionHandle>>,
    closed: AtomicBool,
}

impl RoomState {
    /// Create a new empty room for the given key
    pub fn new(key: RoomKey) -> Self {
        Self {
            key,
            members: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Whether the room has emptied and been discarded
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Add a member
    ///
    /// The duplicate-name check and the insert happen under the same lock,
    /// so two connections racing for one name cannot both get in.
    pub async fn add(&self, handle: ConnectionHandle) -> Result<(), AddError> {
        let mut members = self.members.lock().await;
        if self.is_closed() {
            return Err(AddError::Closed);
        }
        if members.values().any(|m| m.username == handle.username) {
            return Err(AddError::NameTaken);
        }
        members.insert(handle.id, handle);
        Ok(())
    }

    /// Remove a member
    ///
    /// Returns the removed handle, or None if it was not a member. The
    /// second element is true when this removal emptied (and closed) the room.
    pub async fn remove(&self, id: ClientId) -> (Option<ConnectionHandle>, bool) {
        let mut members = self.members.lock().await;
        let removed = members.remove(&id);
        let emptied = removed.is_some() && members.is_empty();
        if emptied {
            self.closed.store(true, Ordering::Release);
        }
        (removed, emptied)
    }

    /// Snapshot of the current members
    pub async fn members(&self) -> Vec<ConnectionHandle> {
        self.members.lock().await.values().cloned().collect()
    }

    /// Look up a current member by display name
    pub async fn find_by_username(&self, name: &str) -> Option<ConnectionHandle> {
        self.members
            .lock()
            .await
            .values()
            .find(|m| m.username == name)
            .cloned()
    }

    /// Number of current members
    pub async fn member_count(&self) -> usize {
        self.members.lock().await.len()
    }

    /// Hold the membership lock (used by broadcast to enqueue atomically)
    pub(crate) async fn lock_members(&self) -> MutexGuard<'_, HashMap<ClientId, ConnectionHandle>> {
        self.members.lock().await
    }
}
