//! Two-Party Signaling
//!
//! Pairs two peers in a room and relays their connection-negotiation
//! messages. The relay never looks inside offer/answer/candidate payloads.
//!
//! ## Architecture
//!
//! - **RoomRegistry**: room id → room, one mutex per room
//! - **Room**: uid → connection handle, at most two members
//! - **Router**: join/leave/relay semantics over the registry
//! - **Session**: per-connection state machine
//! - **Handler**: WebSocket upgrade, reader loop and writer task
//!
//! ## Protocol
//!
//! | cmd | direction | fields |
//! |---|---|---|
//! | `join` | client → server | `roomId`, `uid` |
//! | `leave` | client → server | `roomId`, `uid` |
//! | `offer` / `answer` / `candidate` | client → server → peer | `roomId`, `uid`, `remoteUid`, `msg` |
//! | `new-peer` | server → client | `remoteUid` |
//! | `resp-join` | server → client | `remoteUid` |
//! | `peer-leave` | server → client | `remoteUid` |
//! | `room-full` | server → client | `roomId` |
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:3000/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({cmd: 'join', roomId: '100', uid: 'alice'}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.cmd === 'new-peer') {
//!     // we were here first: create and send the offer to msg.remoteUid
//!   }
//! };
//! ```

mod connection;
mod error;
mod handler;
mod messages;
mod registry;
mod room;
mod router;
mod session;

pub use connection::{new_connection_id, ConnectionHandle, ConnectionId, OutboundSender};
pub use error::{RouteError, SessionError};
pub use handler::websocket_handler;
pub use messages::{
    parse_client_message, ClientMessage, Outbound, RelayEnvelope, RelayKind, RoomId,
    ServerMessage, Uid,
};
pub use registry::{RegistryStats, RoomRegistry, SharedRoom};
pub use room::{Room, RoomFull, ROOM_CAPACITY};
pub use router::{JoinOutcome, LeaveOutcome, RoutePolicy, Router};
pub use session::{Session, SessionState};
