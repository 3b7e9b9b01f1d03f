//! Process-wide room registry
//!
//! Maps room keys to live rooms. The registry lock covers only lookup,
//! insert and removal of map entries; membership itself is guarded by
//! each room's own lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::client::ConnectionHandle;
use crate::error::AuthError;
use crate::room::{AddError, RoomState};
use crate::types::{ClientId, RoomKey};

/// Outcome of a leave call that actually removed someone
#[derive(Debug)]
pub struct Departure {
    /// The handle that left
    pub handle: ConnectionHandle,
    /// The room it left (possibly now closed)
    pub room: Arc<RoomState>,
    /// Whether the room was discarded
    pub room_removed: bool,
}

/// All active rooms: RoomKey -> RoomState
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomKey, Arc<RoomState>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handle to the room for `key`, creating the room if needed
    ///
    /// Concurrent joins for a new key end up in the same room. A join that
    /// lands on a room closed by a concurrent last-leave retries on a
    /// fresh one.
    pub async fn join(
        &self,
        key: RoomKey,
        handle: ConnectionHandle,
    ) -> Result<Arc<RoomState>, AuthError> {
        loop {
            let room = self.get_or_create(&key).await;
            match room.add(handle.clone()).await {
                Ok(()) => {
                    info!("Client {} ({}) joined room {}", handle.id, handle.username, key);
                    return Ok(room);
                }
                Err(AddError::NameTaken) => {
                    return Err(AuthError::NameTaken(handle.username));
                }
                Err(AddError::Closed) => {
                    debug!("Room {} closed during join, retrying", key);
                }
            }
        }
    }

    /// Remove a connection from the room for `key`
    ///
    /// Idempotent: leaving a room one is not in is a no-op returning None.
    pub async fn leave(&self, key: &RoomKey, id: ClientId) -> Option<Departure> {
        let room = self.rooms.lock().await.get(key).cloned()?;

        let (removed, emptied) = room.remove(id).await;
        let handle = removed?;
        info!("Client {} ({}) left room {}", id, handle.username, key);

        if emptied {
            let mut rooms = self.rooms.lock().await;
            // A join may already have replaced the closed room
            if rooms.get(key).is_some_and(|current| Arc::ptr_eq(current, &room)) {
                rooms.remove(key);
            }
            debug!("Room {} deleted (empty), total rooms: {}", key, rooms.len());
        }

        Some(Departure {
            handle,
            room,
            room_removed: emptied,
        })
    }

    /// Current room for `key`, if any
    pub async fn get(&self, key: &RoomKey) -> Option<Arc<RoomState>> {
        self.rooms.lock().await.get(key).cloned()
    }

    /// Number of live rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Number of members across all rooms
    pub async fn connection_count(&self) -> usize {
        let mut total = 0;
        for room in self.snapshot().await {
            total += room.member_count().await;
        }
        total
    }

    /// Number of members across all rooms with the given public name
    pub async fn count_in_rooms_named(&self, name: &str) -> usize {
        let mut total = 0;
        for room in self.snapshot().await {
            if room.key.name() == name {
                total += room.member_count().await;
            }
        }
        total
    }

    async fn snapshot(&self) -> Vec<Arc<RoomState>> {
        self.rooms.lock().await.values().cloned().collect()
    }

    async fn get_or_create(&self, key: &RoomKey) -> Arc<RoomState> {
        let mut rooms = self.rooms.lock().await;
        match rooms.get(key) {
            Some(room) if !room.is_closed() => room.clone(),
            _ => {
                let room = Arc::new(RoomState::new(key.clone()));
                rooms.insert(key.clone(), room.clone());
                info!("Room {} created, total rooms: {}", key, rooms.len());
                room
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::message::Envelope;

    fn handle(name: &str) -> (ConnectionHandle, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(8);
        (ConnectionHandle::new(ClientId::new(), name, tx), rx)
    }

    #[tokio::test]
    async fn test_same_key_shares_room() {
        let registry = RoomRegistry::new();
        let key = RoomKey::new("lobby", "pw");
        let (u1, _rx1) = handle("U1");
        let (u2, _rx2) = handle("U2");

        let r1 = registry.join(key.clone(), u1).await.unwrap();
        let r2 = registry.join(key.clone(), u2).await.unwrap();

        assert!(Arc::ptr_eq(&r1, &r2));
        assert_eq!(r1.member_count().await, 2);
        assert_eq!(registry.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_different_secret_isolated() {
        let registry = RoomRegistry::new();
        let (u1, _rx1) = handle("U1");
        let (u3, _rx3) = handle("U1");

        let r1 = registry.join(RoomKey::new("lobby", "pw"), u1).await.unwrap();
        let r3 = registry.join(RoomKey::new("lobby", "other"), u3).await.unwrap();

        assert!(!Arc::ptr_eq(&r1, &r3));
        assert_eq!(r1.member_count().await, 1);
        assert_eq!(r3.member_count().await, 1);
        assert_eq!(registry.room_count().await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_auth_error() {
        let registry = RoomRegistry::new();
        let key = RoomKey::new("lobby", "pw");
        let (first, _rx1) = handle("U1");
        let (second, _rx2) = handle("U1");

        registry.join(key.clone(), first).await.unwrap();
        let err = registry.join(key, second).await.unwrap_err();
        assert_eq!(err, AuthError::NameTaken("U1".to_string()));
    }

    #[tokio::test]
    async fn test_leave_twice_is_noop() {
        let registry = RoomRegistry::new();
        let key = RoomKey::new("lobby", "pw");
        let (u1, _rx1) = handle("U1");
        let (u2, _rx2) = handle("U2");
        registry.join(key.clone(), u1.clone()).await.unwrap();
        registry.join(key.clone(), u2).await.unwrap();

        let first = registry.leave(&key, u1.id).await;
        assert!(first.is_some());
        assert!(!first.unwrap().room_removed);

        assert!(registry.leave(&key, u1.id).await.is_none());
        assert_eq!(registry.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_empty_room_removed_and_recreated_fresh() {
        let registry = RoomRegistry::new();
        let key = RoomKey::new("lobby", "pw");
        let (u1, _rx1) = handle("U1");
        let old = registry.join(key.clone(), u1.clone()).await.unwrap();

        let departure = registry.leave(&key, u1.id).await.unwrap();
        assert!(departure.room_removed);
        assert_eq!(registry.room_count().await, 0);
        assert!(registry.get(&key).await.is_none());

        let (u2, _rx2) = handle("U2");
        let fresh = registry.join(key.clone(), u2).await.unwrap();
        assert!(!Arc::ptr_eq(&old, &fresh));
        assert_eq!(fresh.member_count().await, 1);
    }

    #[tokio::test]
    async fn test_leave_unknown_room_is_noop() {
        let registry = RoomRegistry::new();
        let key = RoomKey::new("nowhere", "");
        assert!(registry.leave(&key, ClientId::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_joins_share_one_room() {
        let registry = Arc::new(RoomRegistry::new());
        let key = RoomKey::new("race", "pw");
        let mut tasks = Vec::new();
        let mut receivers = Vec::new();

        for i in 0..16 {
            let (h, rx) = handle(&format!("user{}", i));
            receivers.push(rx);
            let registry = registry.clone();
            let key = key.clone();
            tasks.push(tokio::spawn(async move { registry.join(key, h).await }));
        }

        let mut rooms = Vec::new();
        for task in tasks {
            rooms.push(task.await.unwrap().unwrap());
        }

        assert!(rooms.iter().all(|r| Arc::ptr_eq(r, &rooms[0])));
        assert_eq!(rooms[0].member_count().await, 16);
        assert_eq!(registry.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_same_name_admits_one() {
        let registry = Arc::new(RoomRegistry::new());
        let key = RoomKey::new("race", "pw");
        let mut tasks = Vec::new();
        let mut receivers = Vec::new();

        for _ in 0..8 {
            let (h, rx) = handle("same");
            receivers.push(rx);
            let registry = registry.clone();
            let key = key.clone();
            tasks.push(tokio::spawn(async move { registry.join(key, h).await }));
        }

        let mut admitted = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(e) => assert_eq!(e, AuthError::NameTaken("same".to_string())),
            }
        }

        assert_eq!(admitted, 1);
        let room = registry.get(&key).await.unwrap();
        assert_eq!(room.member_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_name_across_threads() {
        for _ in 0..50 {
            let registry = Arc::new(RoomRegistry::new());
            let key = RoomKey::new("race", "pw");
            let mut tasks = Vec::new();
            let mut receivers = Vec::new();

            for _ in 0..8 {
                let (h, rx) = handle("same");
                receivers.push(rx);
                let registry = registry.clone();
                let key = key.clone();
                tasks.push(tokio::spawn(async move { registry.join(key, h).await }));
            }

            let mut admitted = 0;
            for task in tasks {
                if task.await.unwrap().is_ok() {
                    admitted += 1;
                }
            }
            assert_eq!(admitted, 1);
        }
    }

    #[tokio::test]
    async fn test_counts_by_room_name() {
        let registry = RoomRegistry::new();
        let (a, _rxa) = handle("A");
        let (b, _rxb) = handle("B");
        let (c, _rxc) = handle("C");
        registry.join(RoomKey::new("general", ""), a).await.unwrap();
        registry.join(RoomKey::new("general", "default"), b).await.unwrap();
        registry.join(RoomKey::new("lobby", ""), c).await.unwrap();

        assert_eq!(registry.count_in_rooms_named("general").await, 2);
        assert_eq!(registry.connection_count().await, 3);
        assert_eq!(registry.room_count().await, 3);
    }
}
