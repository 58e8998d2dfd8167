//! Signaling Error Types
//!
//! None of these reach the client as an error frame. They exist so the
//! connection loop can log why a frame went nowhere.

use thiserror::Error;

use super::messages::{RoomId, Uid};

/// Why the router did not deliver a message
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("Room {room_id} is full")]
    RoomFull { room_id: RoomId },

    #[error("Room {room_id} not found")]
    RoomNotFound { room_id: RoomId },

    #[error("{uid} is not a member of room {room_id}")]
    NotInRoom { room_id: RoomId, uid: Uid },

    #[error("Peer {remote_uid} not found in room {room_id}")]
    PeerNotFound { room_id: RoomId, remote_uid: Uid },

    #[error("Connection for {uid} is gone")]
    Disconnected { uid: Uid },
}

/// Errors raised while handling one inbound frame
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Binary frames are not supported")]
    UnsupportedFrame,

    #[error("Connection has not joined a room")]
    NotJoined,

    #[error("Session is closed")]
    Closed,

    #[error(transparent)]
    Route(#[from] RouteError),
}

impl SessionError {
    /// Whether this error is part of normal protocol noise rather than
    /// something an operator would want to see.
    pub fn is_routine(&self) -> bool {
        !matches!(self, SessionError::Route(RouteError::RoomFull { .. }))
    }
}
