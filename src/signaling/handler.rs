//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the connection lifecycle.

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{stream::SplitStream, SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, OwnedSemaphorePermit};

use super::connection::new_connection_id;
use super::error::SessionError;
use super::messages::Outbound;
use super::router::Router;
use super::session::Session;
use crate::api::AppState;

/// How long the writer gets to flush pending frames after a leave
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// WebSocket upgrade handler
///
/// This is the entry point for signaling connections.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let permit = Arc::clone(&state.connection_slots).try_acquire_owned().ok();
    let router = state.router.clone();
    ws.on_upgrade(move |socket| async move {
        match permit {
            Some(permit) => handle_socket(socket, router, permit).await,
            None => reject_socket(socket).await,
        }
    })
}

/// Turn away a connection over the configured limit
async fn reject_socket(mut socket: WebSocket) {
    tracing::warn!("Connection limit reached, rejecting WebSocket");
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: close_code::AGAIN,
            reason: "Too many connections".into(),
        })))
        .await;
}

enum Ended {
    /// Writer stopped: socket write failed
    Transport,
    /// Reader stopped: client closed, read error, or session closed
    Inbound,
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, router: Router, _permit: OwnedSemaphorePermit) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();

    let connection_id = new_connection_id();
    tracing::info!(connection_id = %connection_id, "WebSocket connected");

    let conn_id_for_send = connection_id.clone();

    // Task to forward queued frames to the WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(item) = rx.recv().await {
            let message = match item {
                Outbound::Signal(msg) => match serde_json::to_string(&msg) {
                    Ok(text) => Message::Text(text),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to serialize message");
                        continue;
                    }
                },
                Outbound::Forward(text) => Message::Text(text),
                Outbound::Close => {
                    let _ = sender
                        .send(Message::Close(Some(CloseFrame {
                            code: close_code::NORMAL,
                            reason: "".into(),
                        })))
                        .await;
                    break;
                }
            };

            if sender.send(message).await.is_err() {
                tracing::debug!(
                    connection_id = %conn_id_for_send,
                    "WebSocket send failed, closing connection"
                );
                break;
            }
        }
    });

    let mut session = Session::new(connection_id.clone(), tx.clone(), router);

    let ended = tokio::select! {
        _ = &mut send_task => Ended::Transport,
        _ = receive_loop(&mut receiver, &mut session) => Ended::Inbound,
    };

    // Same departure path for leave, close frame, and transport error
    session.close().await;

    if let Ended::Inbound = ended {
        let _ = tx.send(Outbound::Close);
        if tokio::time::timeout(CLOSE_GRACE, &mut send_task).await.is_err() {
            send_task.abort();
        }
    }

    tracing::info!(connection_id = %connection_id, "WebSocket disconnected");
}

/// Read frames until the client goes away or the session closes
async fn receive_loop(receiver: &mut SplitStream<WebSocket>, session: &mut Session) {
    while let Some(result) = receiver.next().await {
        match result {
            Ok(msg) => {
                if !handle_ws_message(session, msg).await {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(
                    connection_id = %session.connection_id(),
                    error = %e,
                    "WebSocket receive error"
                );
                break;
            }
        }
    }
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(session: &mut Session, message: Message) -> bool {
    let result = match message {
        Message::Text(text) => session.handle_text(&text).await,
        Message::Binary(_) => Err(SessionError::UnsupportedFrame),
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => Ok(()),
        Message::Close(_) => {
            tracing::debug!(connection_id = %session.connection_id(), "Client requested close");
            return false;
        }
    };

    if let Err(e) = result {
        if e.is_routine() {
            tracing::debug!(
                connection_id = %session.connection_id(),
                error = %e,
                "Frame dropped"
            );
        } else {
            tracing::info!(
                connection_id = %session.connection_id(),
                error = %e,
                "Frame rejected"
            );
        }
    }

    !session.is_closed()
}
