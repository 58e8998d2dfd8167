//! Room Registry
//!
//! Maps room ids to rooms. Each room sits behind its own mutex so joins and
//! leaves on one room are serialized while other rooms proceed independently.
//!
//! Lock order: the registry lock may be held while waiting for a room lock,
//! never the other way round.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::messages::RoomId;
use super::room::Room;

/// A room shared between the registry and in-flight handlers
pub type SharedRoom = Arc<Mutex<Room>>;

/// Point-in-time view of registry occupancy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Registered rooms, empty ones included
    pub rooms: usize,
    /// Rooms with at least one member
    pub occupied_rooms: usize,
    /// Rooms at capacity
    pub full_rooms: usize,
    /// Joined connections across all rooms
    pub connections: usize,
}

/// All rooms known to the relay
#[derive(Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, SharedRoom>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a room without creating it
    pub async fn get(&self, room_id: &str) -> Option<SharedRoom> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Look up a room, creating an empty one on first use
    pub async fn get_or_create(&self, room_id: &str) -> SharedRoom {
        if let Some(room) = self.get(room_id).await {
            return room;
        }

        let mut rooms = self.rooms.write().await;
        let room = rooms.entry(room_id.to_string()).or_insert_with(|| {
            tracing::debug!(room_id = %room_id, "Room created");
            Arc::new(Mutex::new(Room::new(room_id)))
        });
        Arc::clone(room)
    }

    /// Drop a room from the registry regardless of occupancy.
    ///
    /// The removed room is retired so late joiners holding a reference to it
    /// go back to the registry instead of joining a detached room.
    pub async fn remove(&self, room_id: &str) -> Option<SharedRoom> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.remove(room_id)?;
        room.lock().await.retire();
        tracing::debug!(room_id = %room_id, "Room removed");
        Some(room)
    }

    /// Drop a room only if it currently has no members.
    ///
    /// Returns true if the room was removed.
    pub async fn remove_if_empty(&self, room_id: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get(room_id).cloned() else {
            return false;
        };

        let mut guard = room.lock().await;
        if !guard.is_empty() {
            return false;
        }
        guard.retire();
        drop(guard);

        rooms.remove(room_id);
        tracing::debug!(room_id = %room_id, "Empty room removed");
        true
    }

    /// Tear down every room, asking each joined connection to close.
    ///
    /// Returns the number of connections that were told to close.
    pub async fn close_all(&self) -> usize {
        let mut rooms = self.rooms.write().await;
        let mut closed = 0;

        for (room_id, room) in rooms.drain() {
            let mut guard = room.lock().await;
            guard.retire();
            for handle in guard.drain() {
                if handle.close().is_ok() {
                    closed += 1;
                }
                tracing::debug!(
                    room_id = %room_id,
                    uid = %handle.uid,
                    connection_id = %handle.connection_id,
                    "Closing connection on shutdown"
                );
            }
        }

        tracing::info!(connections = closed, "All rooms closed");
        closed
    }

    /// Get the current number of registered rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Collect occupancy numbers across all rooms
    pub async fn stats(&self) -> RegistryStats {
        let rooms = self.rooms.read().await;
        let mut stats = RegistryStats {
            rooms: rooms.len(),
            ..Default::default()
        };

        for room in rooms.values() {
            let guard = room.lock().await;
            if !guard.is_empty() {
                stats.occupied_rooms += 1;
            }
            if guard.is_full() {
                stats.full_rooms += 1;
            }
            stats.connections += guard.len();
        }

        stats
    }
}
