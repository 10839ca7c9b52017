//! WebSocket handler: binary frame relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID, registers an outgoing queue and enters
//! a `select!` loop:
//! - Incoming client frames → decode + dispatch by syscall
//! - Broadcast frames from services → forward to client
//!
//! Every message is one protobuf-encoded `Frame` in a binary websocket
//! message. Clients only send `presence:heartbeat`; cell writes go through
//! `POST /api/cells` and come back to everyone as `cell:changed`.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `session:connected` with the client ID in `from`,
//!    then a `presence:sync` with the current roster
//! 2. Heartbeats → roster update, `presence:sync` reply
//! 3. Close → unregister, release presence (`presence:leave` if last)

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use frames::{CodecError, Frame, Payload, decode_frame, encode_frame, syscall, topic};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ErrorCode, error_frame};
use crate::services::presence;
use crate::state::AppState;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
enum InboundError {
    #[error("undecodable frame: {0}")]
    Decode(#[from] CodecError),
    #[error("unknown syscall: {0}")]
    UnknownSyscall(String),
    #[error("unexpected payload for {0}")]
    UnexpectedPayload(String),
}

impl ErrorCode for InboundError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "E_DECODE",
            Self::UnknownSyscall(_) => "E_UNKNOWN_SYSCALL",
            Self::UnexpectedPayload(_) => "E_UNEXPECTED_PAYLOAD",
        }
    }
}

/// Per-connection bookkeeping.
struct Connection {
    client_id: Uuid,
    /// User announced by this connection's heartbeats.
    user_id: Option<String>,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let mut conn = Connection { client_id: Uuid::new_v4(), user_id: None };
    let mut client_rx = state.register_client(conn.client_id).await;

    let welcome = Frame::request(syscall::SESSION_CONNECTED, Payload::Empty).with_from(conn.client_id.to_string());
    let sync = sync_frame(presence::roster(&state).await);
    if send_frame(&mut socket, &welcome).await.is_ok() && send_frame(&mut socket, &sync).await.is_ok() {
        info!(client_id = %conn.client_id, "ws: client connected");
        relay(&mut socket, &state, &mut conn, &mut client_rx).await;
    }

    state.unregister_client(conn.client_id).await;
    if let Some(user_id) = conn.user_id.take() {
        presence::release(&state, conn.client_id, &user_id).await;
    }
    info!(client_id = %conn.client_id, "ws: client disconnected");
}

async fn relay(
    socket: &mut WebSocket,
    state: &AppState,
    conn: &mut Connection,
    client_rx: &mut tokio::sync::mpsc::Receiver<Frame>,
) {
    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Binary(bytes) => {
                        for frame in process_inbound(state, conn, &bytes).await {
                            if send_frame(socket, &frame).await.is_err() {
                                return;
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            frame = client_rx.recv() => {
                // Sender dropped: the client was evicted for lagging.
                let Some(frame) = frame else {
                    warn!(client_id = %conn.client_id, "ws: evicted, closing");
                    break;
                };
                if send_frame(socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Decode and handle one inbound message; returns frames for the sender.
async fn process_inbound(state: &AppState, conn: &mut Connection, bytes: &[u8]) -> Vec<Frame> {
    let req = match decode_frame(bytes) {
        Ok(req) => req,
        Err(e) => {
            warn!(client_id = %conn.client_id, error = %e, "ws: invalid inbound frame");
            let err = InboundError::from(e);
            return vec![error_frame(&Frame::request(syscall::GATEWAY_ERROR, Payload::Empty), &err)];
        }
    };
    debug!(client_id = %conn.client_id, id = %req.id, syscall = %req.syscall, "ws: recv frame");

    match req.syscall.as_str() {
        syscall::PRESENCE_HEARTBEAT => handle_heartbeat(state, conn, &req).await,
        other => {
            warn!(client_id = %conn.client_id, syscall = %other, "ws: unknown syscall");
            vec![error_frame(&req, &InboundError::UnknownSyscall(other.to_owned()))]
        }
    }
}

async fn handle_heartbeat(state: &AppState, conn: &mut Connection, req: &Frame) -> Vec<Frame> {
    let Payload::Presence(payload) = &req.payload else {
        return vec![error_frame(req, &InboundError::UnexpectedPayload(req.syscall.clone()))];
    };

    // A connection that switches identity releases the previous one first.
    if let Some(previous) = conn.user_id.take_if(|id| *id != payload.user_id) {
        presence::release(state, conn.client_id, &previous).await;
    }

    match presence::heartbeat(state, conn.client_id, payload.clone()).await {
        Ok(roster) => {
            conn.user_id = Some(payload.user_id.clone());
            let mut sync = sync_frame(roster);
            sync.parent_id = Some(req.id.clone());
            vec![sync]
        }
        Err(e) => vec![error_frame(req, &e)],
    }
}

fn sync_frame(roster: Vec<frames::PresencePayload>) -> Frame {
    Frame::request(syscall::PRESENCE_SYNC, Payload::Roster(roster)).with_topic(topic::PRESENCE)
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), axum::Error> {
    if frame.status == frames::Status::Error {
        warn!(id = %frame.id, syscall = %frame.syscall, "ws: send frame status=Error");
    } else {
        debug!(id = %frame.id, syscall = %frame.syscall, status = ?frame.status, "ws: send frame");
    }
    socket.send(Message::Binary(encode_frame(frame).into())).await
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod ws_test;
