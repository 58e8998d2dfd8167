//! Room
//!
//! Membership of one rendezvous scope, keyed by uid and capped at two.

use std::collections::HashMap;

use super::connection::ConnectionHandle;
use super::messages::{RoomId, Uid};

/// Maximum number of participants in a room
pub const ROOM_CAPACITY: usize = 2;

/// Returned by [`Room::add`] when the room is at capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomFull;

struct Member {
    handle: ConnectionHandle,
    /// Insertion sequence, keeps iteration order stable
    seq: u64,
}

/// Participants of one room
pub struct Room {
    id: RoomId,
    members: HashMap<Uid, Member>,
    next_seq: u64,
    /// Set once the registry has dropped this room; a retired room
    /// must not take new members.
    retired: bool,
}

impl Room {
    pub fn new(id: impl Into<RoomId>) -> Self {
        Self {
            id: id.into(),
            members: HashMap::with_capacity(ROOM_CAPACITY),
            next_seq: 0,
            retired: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Insert or overwrite the entry for `handle.uid`.
    ///
    /// Rejected whenever the room already holds [`ROOM_CAPACITY`] members,
    /// even if the uid is one of them.
    pub fn add(&mut self, handle: ConnectionHandle) -> Result<(), RoomFull> {
        if self.members.len() >= ROOM_CAPACITY {
            return Err(RoomFull);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.members.insert(handle.uid.clone(), Member { handle, seq });
        Ok(())
    }

    /// Remove the entry for `uid`, if any
    pub fn remove(&mut self, uid: &str) -> Option<ConnectionHandle> {
        self.members.remove(uid).map(|m| m.handle)
    }

    /// Remove the entry for `uid` only if it was registered by `connection_id`
    pub fn remove_connection(&mut self, uid: &str, connection_id: &str) -> Option<ConnectionHandle> {
        if self.is_member(uid, connection_id) {
            self.remove(uid)
        } else {
            None
        }
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.members.contains_key(uid)
    }

    /// Whether `uid` is present and was registered by `connection_id`
    pub fn is_member(&self, uid: &str, connection_id: &str) -> bool {
        self.members
            .get(uid)
            .is_some_and(|m| m.handle.belongs_to(connection_id))
    }

    pub fn get(&self, uid: &str) -> Option<&ConnectionHandle> {
        self.members.get(uid).map(|m| &m.handle)
    }

    /// All members other than `uid`, in insertion order
    pub fn others_excluding(&self, uid: &str) -> Vec<&ConnectionHandle> {
        let mut others: Vec<&Member> = self
            .members
            .iter()
            .filter(|(member_uid, _)| member_uid.as_str() != uid)
            .map(|(_, m)| m)
            .collect();
        others.sort_by_key(|m| m.seq);
        others.into_iter().map(|m| &m.handle).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= ROOM_CAPACITY
    }

    pub fn retire(&mut self) {
        self.retired = true;
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    /// Remove every member, in insertion order
    pub fn drain(&mut self) -> Vec<ConnectionHandle> {
        let mut members: Vec<Member> = self.members.drain().map(|(_, m)| m).collect();
        members.sort_by_key(|m| m.seq);
        members.into_iter().map(|m| m.handle).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn handle(uid: &str, connection_id: &str) -> ConnectionHandle {
        let (tx, _rx) = mpsc::unbounded_channel();
        ConnectionHandle::new(connection_id, uid, "room", tx)
    }

    #[test]
    fn test_capacity_is_two() {
        let mut room = Room::new("room");
        assert_eq!(room.id(), "room");
        assert!(room.add(handle("a", "c1")).is_ok());
        assert!(room.add(handle("b", "c2")).is_ok());
        assert_eq!(room.add(handle("c", "c3")), Err(RoomFull));

        assert_eq!(room.len(), 2);
        assert!(room.is_full());
        assert!(room.contains("a"));
        assert!(room.contains("b"));
        assert!(!room.contains("c"));
    }

    #[test]
    fn test_full_room_rejects_existing_uid() {
        let mut room = Room::new("room");
        room.add(handle("a", "c1")).unwrap();
        room.add(handle("b", "c2")).unwrap();

        assert_eq!(room.add(handle("a", "c9")), Err(RoomFull));
        assert!(room.is_member("a", "c1"));
    }

    #[test]
    fn test_add_overwrites_same_uid() {
        let mut room = Room::new("room");
        room.add(handle("a", "c1")).unwrap();
        room.add(handle("a", "c2")).unwrap();

        assert_eq!(room.len(), 1);
        assert!(room.is_member("a", "c2"));
        assert!(!room.is_member("a", "c1"));
    }

    #[test]
    fn test_remove_connection_checks_owner() {
        let mut room = Room::new("room");
        room.add(handle("a", "c2")).unwrap();

        assert!(room.remove_connection("a", "c1").is_none());
        assert!(room.contains("a"));

        assert!(room.remove_connection("a", "c2").is_some());
        assert!(room.is_empty());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut room = Room::new("room");
        room.add(handle("a", "c1")).unwrap();

        assert!(room.remove("zzz").is_none());
        assert_eq!(room.len(), 1);
    }

    #[test]
    fn test_others_excluding_insertion_order() {
        let mut room = Room::new("room");
        room.add(handle("zed", "c1")).unwrap();
        room.add(handle("amy", "c2")).unwrap();

        let others: Vec<&str> = room
            .others_excluding("nobody")
            .into_iter()
            .map(|h| h.uid.as_str())
            .collect();
        assert_eq!(others, vec!["zed", "amy"]);

        let others: Vec<&str> = room
            .others_excluding("zed")
            .into_iter()
            .map(|h| h.uid.as_str())
            .collect();
        assert_eq!(others, vec!["amy"]);
    }

    #[test]
    fn test_drain_empties_room() {
        let mut room = Room::new("room");
        room.add(handle("a", "c1")).unwrap();
        room.add(handle("b", "c2")).unwrap();

        let drained: Vec<String> = room.drain().into_iter().map(|h| h.uid).collect();
        assert_eq!(drained, vec!["a", "b"]);
        assert!(room.is_empty());
    }
}
