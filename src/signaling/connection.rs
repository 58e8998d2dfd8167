//! Connection Handle
//!
//! The relay's only reference to a participant's live WebSocket. Rooms hold
//! these; the writer task on the other end of the channel owns the socket.

use tokio::sync::mpsc;
use uuid::Uuid;

use super::error::RouteError;
use super::messages::{Outbound, RoomId, ServerMessage, Uid};

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Sender half feeding a connection's writer task
pub type OutboundSender = mpsc::UnboundedSender<Outbound>;

/// Generate a fresh connection id
pub fn new_connection_id() -> ConnectionId {
    Uuid::new_v4().to_string()
}

/// Handle for sending messages to one joined participant
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    /// Connection this handle belongs to
    pub connection_id: ConnectionId,
    /// Participant identifier supplied on join
    pub uid: Uid,
    /// Room the participant joined
    pub room_id: RoomId,
    sender: OutboundSender,
}

impl ConnectionHandle {
    pub fn new(
        connection_id: impl Into<ConnectionId>,
        uid: impl Into<Uid>,
        room_id: impl Into<RoomId>,
        sender: OutboundSender,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            uid: uid.into(),
            room_id: room_id.into(),
            sender,
        }
    }

    /// Queue a relay-generated frame
    pub fn notify(&self, message: ServerMessage) -> Result<(), RouteError> {
        self.send(Outbound::Signal(message))
    }

    /// Queue a client frame for verbatim delivery
    pub fn forward(&self, frame: &str) -> Result<(), RouteError> {
        self.send(Outbound::Forward(frame.to_owned()))
    }

    /// Ask the writer task to close the socket
    pub fn close(&self) -> Result<(), RouteError> {
        self.send(Outbound::Close)
    }

    /// Whether this handle was created by the given connection
    pub fn belongs_to(&self, connection_id: &str) -> bool {
        self.connection_id == connection_id
    }

    fn send(&self, item: Outbound) -> Result<(), RouteError> {
        self.sender.send(item).map_err(|_| RouteError::Disconnected {
            uid: self.uid.clone(),
        })
    }
}
