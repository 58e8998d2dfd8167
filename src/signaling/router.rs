//! Signaling Router
//!
//! Decides who receives what for each client command. Holds no state of its
//! own; all membership lives in the [`RoomRegistry`].

use std::sync::Arc;

use super::connection::ConnectionHandle;
use super::error::RouteError;
use super::messages::{RelayEnvelope, RelayKind, ServerMessage, Uid};
use super::registry::RoomRegistry;
use super::room::ROOM_CAPACITY;

/// Room behavior knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePolicy {
    /// Drop a room from the registry once its last member leaves
    pub reap_empty: bool,
    /// Tell a rejected joiner that the room is full
    pub notify_room_full: bool,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            reap_empty: true,
            notify_room_full: true,
        }
    }
}

/// Result of a successful join
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// First one in; nobody was notified
    Waiting,
    /// Room completed; both sides learned each other's uid
    Paired { remote_uid: Uid },
}

/// Result of a successful leave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// Members that were sent `peer-leave`
    pub notified: usize,
    /// Whether the room was dropped from the registry
    pub room_removed: bool,
}

/// Routes client commands against the room registry
#[derive(Clone)]
pub struct Router {
    registry: Arc<RoomRegistry>,
    policy: RoutePolicy,
}

impl Router {
    pub fn new(registry: Arc<RoomRegistry>, policy: RoutePolicy) -> Self {
        Self { registry, policy }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Admit `handle` into its room.
    ///
    /// When the join fills the room the existing member gets `new-peer`
    /// and the joiner gets `resp-join`.
    pub async fn join(&self, handle: ConnectionHandle) -> Result<JoinOutcome, RouteError> {
        loop {
            let room = self.registry.get_or_create(&handle.room_id).await;
            let mut guard = room.lock().await;

            // Reaped between lookup and lock; fetch the replacement.
            if guard.is_retired() {
                continue;
            }

            if guard.add(handle.clone()).is_err() {
                drop(guard);
                tracing::info!(
                    room_id = %handle.room_id,
                    uid = %handle.uid,
                    "Join rejected, room is full"
                );
                if self.policy.notify_room_full {
                    if let Err(e) = handle.notify(ServerMessage::RoomFull {
                        room_id: handle.room_id.clone(),
                    }) {
                        tracing::debug!(error = %e, "room-full not delivered");
                    }
                }
                return Err(RouteError::RoomFull {
                    room_id: handle.room_id,
                });
            }

            tracing::info!(
                room_id = %handle.room_id,
                uid = %handle.uid,
                connection_id = %handle.connection_id,
                members = guard.len(),
                "Joined room"
            );

            if guard.len() < ROOM_CAPACITY {
                return Ok(JoinOutcome::Waiting);
            }

            let mut remote_uid = None;
            for peer in guard.others_excluding(&handle.uid) {
                if let Err(e) = peer.notify(ServerMessage::NewPeer {
                    remote_uid: handle.uid.clone(),
                }) {
                    tracing::debug!(error = %e, "new-peer not delivered");
                }
                if let Err(e) = handle.notify(ServerMessage::RespJoin {
                    remote_uid: peer.uid.clone(),
                }) {
                    tracing::debug!(error = %e, "resp-join not delivered");
                }
                remote_uid = Some(peer.uid.clone());
            }

            return Ok(match remote_uid {
                Some(remote_uid) => JoinOutcome::Paired { remote_uid },
                None => JoinOutcome::Waiting,
            });
        }
    }

    /// Remove `uid` from `room_id` and tell whoever is left.
    ///
    /// Only the connection that registered `uid` can remove it.
    pub async fn leave(
        &self,
        room_id: &str,
        uid: &str,
        connection_id: &str,
    ) -> Result<LeaveOutcome, RouteError> {
        let room = self
            .registry
            .get(room_id)
            .await
            .ok_or_else(|| RouteError::RoomNotFound {
                room_id: room_id.to_string(),
            })?;

        let mut guard = room.lock().await;
        if guard.remove_connection(uid, connection_id).is_none() {
            return Err(RouteError::NotInRoom {
                room_id: room_id.to_string(),
                uid: uid.to_string(),
            });
        }

        let mut notified = 0;
        for peer in guard.others_excluding(uid) {
            match peer.notify(ServerMessage::PeerLeave {
                remote_uid: uid.to_string(),
            }) {
                Ok(()) => notified += 1,
                Err(e) => tracing::debug!(error = %e, "peer-leave not delivered"),
            }
        }

        let now_empty = guard.is_empty();
        drop(guard);

        tracing::info!(
            room_id = %room_id,
            uid = %uid,
            connection_id = %connection_id,
            notified,
            "Left room"
        );

        let room_removed =
            now_empty && self.policy.reap_empty && self.registry.remove_if_empty(room_id).await;

        Ok(LeaveOutcome {
            notified,
            room_removed,
        })
    }

    /// Forward an offer/answer/candidate frame to `envelope.remote_uid`.
    ///
    /// `frame` is delivered exactly as received. The sender must be the
    /// connection that registered `envelope.uid` in the room.
    pub async fn relay(
        &self,
        kind: RelayKind,
        envelope: &RelayEnvelope,
        connection_id: &str,
        frame: &str,
    ) -> Result<(), RouteError> {
        let room = self
            .registry
            .get(&envelope.room_id)
            .await
            .ok_or_else(|| RouteError::RoomNotFound {
                room_id: envelope.room_id.clone(),
            })?;

        let guard = room.lock().await;
        if !guard.is_member(&envelope.uid, connection_id) {
            return Err(RouteError::NotInRoom {
                room_id: envelope.room_id.clone(),
                uid: envelope.uid.clone(),
            });
        }

        let peer = guard
            .get(&envelope.remote_uid)
            .ok_or_else(|| RouteError::PeerNotFound {
                room_id: envelope.room_id.clone(),
                remote_uid: envelope.remote_uid.clone(),
            })?;

        peer.forward(frame)?;

        tracing::debug!(
            cmd = %kind,
            room_id = %envelope.room_id,
            uid = %envelope.uid,
            remote_uid = %envelope.remote_uid,
            "Relayed"
        );
        Ok(())
    }
}
