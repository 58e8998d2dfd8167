//! Per-connection signaling state machine
//!
//! ```text
//! Connected ──join──▶ Joined ──leave / transport close──▶ Closed
//!                      │  ▲
//!                      └──┘ join (departs old room first)
//! ```

use super::connection::{ConnectionHandle, ConnectionId, OutboundSender};
use super::error::{RouteError, SessionError};
use super::messages::{parse_client_message, ClientMessage, RelayKind, RoomId, Uid};
use super::router::Router;

/// Where a connection is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Transport open, no room yet
    Connected,
    /// Member of exactly one room
    Joined { room_id: RoomId, uid: Uid },
    /// Terminal
    Closed,
}

/// Signaling state for one WebSocket connection
pub struct Session {
    connection_id: ConnectionId,
    sender: OutboundSender,
    router: Router,
    state: SessionState,
}

impl Session {
    pub fn new(connection_id: ConnectionId, sender: OutboundSender, router: Router) -> Self {
        Self {
            connection_id,
            sender,
            router,
            state: SessionState::Connected,
        }
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Handle one inbound text frame
    pub async fn handle_text(&mut self, text: &str) -> Result<(), SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }

        let message = parse_client_message(text)?;
        tracing::trace!(
            connection_id = %self.connection_id,
            cmd = message.cmd(),
            "Frame received"
        );

        match message {
            ClientMessage::Join { room_id, uid } => self.join(room_id, uid).await,
            ClientMessage::Leave { room_id, uid } => self.leave(&room_id, &uid).await,
            ClientMessage::Offer(envelope) => {
                self.router
                    .relay(RelayKind::Offer, &envelope, &self.connection_id, text)
                    .await?;
                Ok(())
            }
            ClientMessage::Answer(envelope) => {
                self.router
                    .relay(RelayKind::Answer, &envelope, &self.connection_id, text)
                    .await?;
                Ok(())
            }
            ClientMessage::Candidate(envelope) => {
                self.router
                    .relay(RelayKind::Candidate, &envelope, &self.connection_id, text)
                    .await?;
                Ok(())
            }
        }
    }

    /// Run the departure path once and move to `Closed`.
    ///
    /// Returns true if a room membership was given up. Safe to call again.
    pub async fn close(&mut self) -> bool {
        // State changes only after the departure completes, so a close that
        // is dropped mid-way still departs on the next call.
        let departed = match self.state.clone() {
            SessionState::Joined { room_id, uid } => self.depart(&room_id, &uid).await,
            SessionState::Connected | SessionState::Closed => false,
        };
        self.state = SessionState::Closed;
        departed
    }

    async fn join(&mut self, room_id: RoomId, uid: Uid) -> Result<(), SessionError> {
        if let SessionState::Joined {
            room_id: old_room,
            uid: old_uid,
        } = self.state.clone()
        {
            tracing::debug!(
                connection_id = %self.connection_id,
                from = %old_room,
                to = %room_id,
                "Switching rooms"
            );
            self.depart(&old_room, &old_uid).await;
            self.state = SessionState::Connected;
        }

        let handle = ConnectionHandle::new(
            self.connection_id.clone(),
            uid.clone(),
            room_id.clone(),
            self.sender.clone(),
        );
        self.router.join(handle).await?;
        self.state = SessionState::Joined { room_id, uid };
        Ok(())
    }

    async fn leave(&mut self, room_id: &str, uid: &str) -> Result<(), SessionError> {
        let own_membership = matches!(
            &self.state,
            SessionState::Joined { room_id: r, uid: u } if r == room_id && u == uid
        );
        if own_membership {
            self.close().await;
            return Ok(());
        }

        match &self.state {
            SessionState::Joined { .. } => Err(RouteError::NotInRoom {
                room_id: room_id.to_string(),
                uid: uid.to_string(),
            }
            .into()),
            SessionState::Connected => Err(SessionError::NotJoined),
            SessionState::Closed => Err(SessionError::Closed),
        }
    }

    async fn depart(&self, room_id: &str, uid: &str) -> bool {
        match self.router.leave(room_id, uid, &self.connection_id).await {
            Ok(_) => true,
            Err(e) => {
                // Already displaced, e.g. by a same-uid join from another connection
                tracing::debug!(
                    connection_id = %self.connection_id,
                    error = %e,
                    "Nothing to leave"
                );
                false
            }
        }
    }
}
