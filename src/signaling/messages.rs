//! Signaling Message Types
//!
//! Defines the JSON frames exchanged between peers and the relay.
//! Every frame is an object carrying a `cmd` field that selects its kind.
//!
//! `roomId`, `uid` and `remoteUid` may be JSON strings or numbers. Both are
//! keyed by their decimal string form, so `7`, `7.0` and `"7"` name the same
//! room or participant. Clients built from text inputs and clients sending
//! numbers can therefore meet in one room.

use serde::{Deserialize, Deserializer, Serialize};

/// Room identifier as seen by the relay
pub type RoomId = String;

/// Participant identifier, chosen by the client
pub type Uid = String;

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Enter a room
    Join {
        #[serde(rename = "roomId", deserialize_with = "deserialize_id")]
        room_id: RoomId,
        #[serde(deserialize_with = "deserialize_id")]
        uid: Uid,
    },
    /// Leave the room this connection joined
    Leave {
        #[serde(rename = "roomId", deserialize_with = "deserialize_id")]
        room_id: RoomId,
        #[serde(deserialize_with = "deserialize_id")]
        uid: Uid,
    },
    /// Session description offer for the remote peer
    Offer(RelayEnvelope),
    /// Session description answer for the remote peer
    Answer(RelayEnvelope),
    /// Network path candidate for the remote peer
    Candidate(RelayEnvelope),
}

impl ClientMessage {
    /// Wire name of this message kind
    pub fn cmd(&self) -> &'static str {
        match self {
            ClientMessage::Join { .. } => "join",
            ClientMessage::Leave { .. } => "leave",
            ClientMessage::Offer(_) => RelayKind::Offer.as_str(),
            ClientMessage::Answer(_) => RelayKind::Answer.as_str(),
            ClientMessage::Candidate(_) => RelayKind::Candidate.as_str(),
        }
    }
}

/// Addressing fields of an offer/answer/candidate frame.
///
/// The `msg` payload is not captured; the relay forwards the received
/// frame text and never looks inside it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelayEnvelope {
    #[serde(rename = "roomId", deserialize_with = "deserialize_id")]
    pub room_id: RoomId,
    #[serde(deserialize_with = "deserialize_id")]
    pub uid: Uid,
    #[serde(rename = "remoteUid", deserialize_with = "deserialize_id")]
    pub remote_uid: Uid,
}

/// The three negotiation message kinds that are relayed verbatim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayKind {
    Offer,
    Answer,
    Candidate,
}

impl RelayKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelayKind::Offer => "offer",
            RelayKind::Answer => "answer",
            RelayKind::Candidate => "candidate",
        }
    }
}

impl std::fmt::Display for RelayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Someone joined the room you are waiting in
    NewPeer {
        #[serde(rename = "remoteUid")]
        remote_uid: Uid,
    },
    /// Your join completed the room; this is who is already there
    RespJoin {
        #[serde(rename = "remoteUid")]
        remote_uid: Uid,
    },
    /// Your peer left the room
    PeerLeave {
        #[serde(rename = "remoteUid")]
        remote_uid: Uid,
    },
    /// Your join was rejected because the room already holds two peers
    RoomFull {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },
}

/// Item queued for a connection's writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Frame generated by the relay
    Signal(ServerMessage),
    /// Client frame forwarded untouched
    Forward(String),
    /// Close the WebSocket
    Close,
}

/// Parse one inbound text frame
pub fn parse_client_message(text: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str(text)
}

/// Accepts a JSON string or number and yields its string form.
///
/// Integer-valued floats collapse to the integer form, so `7.0` and `7`
/// produce `"7"`.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Unsigned(n) => n.to_string(),
        RawId::Signed(n) => n.to_string(),
        RawId::Float(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_deserialize_join() {
        let json = r#"{"cmd": "join", "roomId": "100", "uid": "alice"}"#;
        let msg = parse_client_message(json).unwrap();
        match msg {
            ClientMessage::Join { room_id, uid } => {
                assert_eq!(room_id, "100");
                assert_eq!(uid, "alice");
            }
            _ => panic!("Expected Join"),
        }
    }

    #[test]
    fn test_numeric_room_id_is_normalised() {
        let json = r#"{"cmd": "leave", "roomId": 100, "uid": 42}"#;
        let msg = parse_client_message(json).unwrap();
        match msg {
            ClientMessage::Leave { room_id, uid } => {
                assert_eq!(room_id, "100");
                assert_eq!(uid, "42");
            }
            _ => panic!("Expected Leave"),
        }
    }

    #[test]
    fn test_string_and_number_ids_share_a_key() {
        let ids = |json: &str| match parse_client_message(json).unwrap() {
            ClientMessage::Join { room_id, uid } => (room_id, uid),
            _ => panic!("Expected Join"),
        };

        let text = ids(r#"{"cmd": "join", "roomId": "7", "uid": "1"}"#);
        assert_eq!(ids(r#"{"cmd": "join", "roomId": 7, "uid": 1}"#), text);
        assert_eq!(ids(r#"{"cmd": "join", "roomId": 7.0, "uid": 1.0}"#), text);
        assert_eq!(ids(r#"{"cmd": "join", "roomId": -3, "uid": 2.5}"#).0, "-3");
        assert_eq!(ids(r#"{"cmd": "join", "roomId": -3, "uid": 2.5}"#).1, "2.5");
    }

    #[test]
    fn test_client_message_deserialize_candidate() {
        let json = r#"{"cmd":"candidate","roomId":"1","uid":"a","remoteUid":"b","msg":"{\"candidate\":\"x\"}"}"#;
        let msg = parse_client_message(json).unwrap();
        assert_eq!(msg.cmd(), "candidate");
        match msg {
            ClientMessage::Candidate(envelope) => {
                assert_eq!(
                    envelope,
                    RelayEnvelope {
                        room_id: "1".to_string(),
                        uid: "a".to_string(),
                        remote_uid: "b".to_string(),
                    }
                );
            }
            _ => panic!("Expected Candidate"),
        }
    }

    #[test]
    fn test_malformed_frames_are_rejected() {
        assert!(parse_client_message("not json").is_err());
        assert!(parse_client_message(r#"{"roomId": "1", "uid": "a"}"#).is_err());
        assert!(parse_client_message(r#"{"cmd": "dance", "roomId": "1"}"#).is_err());
        assert!(parse_client_message(r#"{"cmd": "join", "roomId": "1"}"#).is_err());
        assert!(parse_client_message(r#"{"cmd": "offer", "roomId": "1", "uid": "a"}"#).is_err());
        assert!(parse_client_message(r#"{"cmd": "join", "roomId": [1], "uid": "a"}"#).is_err());
        // server-only kinds are not accepted from clients
        assert!(parse_client_message(r#"{"cmd": "new-peer", "remoteUid": "a"}"#).is_err());
    }

    #[test]
    fn test_server_message_serialize_new_peer() {
        let msg = ServerMessage::NewPeer {
            remote_uid: "bob".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"cmd":"new-peer","remoteUid":"bob"}"#);
    }

    #[test]
    fn test_server_message_serialize_room_full() {
        let msg = ServerMessage::RoomFull {
            room_id: "9".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"cmd":"room-full","roomId":"9"}"#);

        let msg = ServerMessage::PeerLeave {
            remote_uid: "a".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"cmd\":\"peer-leave\""));
    }
}
