//! Shared frame model and protobuf codec for the pixelboard realtime channel.
//!
//! This crate owns the wire representation used by both the `server` relay
//! and the `pixelboard` engine. Payloads are typed (cell, presence, roster,
//! error) rather than free-form, so both ends agree on the exact fields of
//! every event without a JSON detour.

use std::time::{SystemTime, UNIX_EPOCH};

use prost::Message;
use serde::{Deserialize, Serialize};

/// Well-known syscall names.
pub mod syscall {
    /// Server greeting sent once per connection.
    pub const SESSION_CONNECTED: &str = "session:connected";
    /// Authoritative cell record after a successful write.
    pub const CELL_CHANGED: &str = "cell:changed";
    /// A user became present.
    pub const PRESENCE_JOIN: &str = "presence:join";
    /// A user left.
    pub const PRESENCE_LEAVE: &str = "presence:leave";
    /// Full roster snapshot.
    pub const PRESENCE_SYNC: &str = "presence:sync";
    /// Client announcement of its own presence.
    pub const PRESENCE_HEARTBEAT: &str = "presence:heartbeat";
    /// Server complaint about an inbound frame it could not route.
    pub const GATEWAY_ERROR: &str = "gateway:error";
}

/// Broadcast topics.
pub mod topic {
    pub const CELLS: &str = "cells";
    pub const PRESENCE: &str = "presence";
}

/// Error returned by [`decode_frame`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw bytes could not be decoded as a protobuf `WireFrame`.
    #[error("failed to decode protobuf frame: {0}")]
    Decode(#[from] prost::DecodeError),
    /// The `status` integer on the wire does not map to a known [`Status`] variant.
    #[error("invalid frame status: {0}")]
    InvalidStatus(i32),
}

/// Lifecycle status of a frame in a request/response exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Request or unsolicited event.
    Request,
    /// Error response to a request.
    Error,
}

impl Status {
    fn as_wire(self) -> WireFrameStatus {
        match self {
            Self::Request => WireFrameStatus::Request,
            Self::Error => WireFrameStatus::Error,
        }
    }

    fn from_wire(value: i32) -> Result<Self, CodecError> {
        match WireFrameStatus::try_from(value) {
            Ok(WireFrameStatus::Request) => Ok(Self::Request),
            Ok(WireFrameStatus::Error) => Ok(Self::Error),
            Err(_) => Err(CodecError::InvalidStatus(value)),
        }
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// One cell record as carried on the wire. Unvalidated: the color is raw text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPayload {
    pub x: i64,
    pub y: i64,
    pub color: String,
    pub revision: u64,
    pub author: Option<String>,
}

/// One presence roster entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePayload {
    pub user_id: String,
    pub email: String,
    /// Milliseconds since the Unix epoch when the server last saw this user.
    pub seen_at: i64,
}

/// Structured error carried by `Status::Error` frames.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Grepable error code, e.g. `"E_INVALID_CELL"`.
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

/// Typed frame body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Payload {
    #[default]
    Empty,
    Cell(CellPayload),
    Presence(PresencePayload),
    Roster(Vec<PresencePayload>),
    Error(ErrorPayload),
}

// =============================================================================
// FRAME
// =============================================================================

/// A single message on the realtime wire protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Unique identifier for this frame (UUID string).
    pub id: String,
    /// ID of the request frame this is responding to, if any.
    pub parent_id: Option<String>,
    /// Milliseconds since the Unix epoch when the frame was created.
    pub ts: i64,
    /// Broadcast topic (`cells` or `presence`), if any.
    pub topic: Option<String>,
    /// Sender identifier (user ID or system label).
    pub from: Option<String>,
    /// Namespaced operation name, e.g. `"cell:changed"`.
    pub syscall: String,
    /// Lifecycle position of the frame.
    pub status: Status,
    pub payload: Payload,
}

/// Current time as milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

impl Frame {
    /// Create a request (or unsolicited event) frame.
    pub fn request(syscall: impl Into<String>, payload: Payload) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            parent_id: None,
            ts: now_ms(),
            topic: None,
            from: None,
            syscall: syscall.into(),
            status: Status::Request,
            payload,
        }
    }

    /// Create a structured error response. Inherits `topic` and `syscall`.
    #[must_use]
    pub fn error(&self, code: &str, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            parent_id: Some(self.id.clone()),
            ts: now_ms(),
            topic: self.topic.clone(),
            from: None,
            syscall: self.syscall.clone(),
            status: Status::Error,
            payload: Payload::Error(ErrorPayload { code: code.to_owned(), message: message.into(), retryable }),
        }
    }

    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    #[must_use]
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }
}

// =============================================================================
// CODEC
// =============================================================================

/// Encode a frame into protobuf bytes.
#[must_use]
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    let wire = frame_to_wire(frame);
    // `encode_to_vec` sizes the buffer up front and cannot fail.
    wire.encode_to_vec()
}

/// Decode protobuf bytes into a frame.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes and
/// [`CodecError::InvalidStatus`] for out-of-range status values.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, CodecError> {
    let wire = WireFrame::decode(bytes)?;
    wire_to_frame(wire)
}

fn frame_to_wire(frame: &Frame) -> WireFrame {
    WireFrame {
        id: frame.id.clone(),
        parent_id: frame.parent_id.clone(),
        ts: frame.ts,
        topic: frame.topic.clone(),
        from: frame.from.clone(),
        syscall: frame.syscall.clone(),
        status: frame.status.as_wire() as i32,
        payload: payload_to_wire(&frame.payload),
    }
}

fn wire_to_frame(wire: WireFrame) -> Result<Frame, CodecError> {
    Ok(Frame {
        id: wire.id,
        parent_id: wire.parent_id,
        ts: wire.ts,
        topic: wire.topic,
        from: wire.from,
        syscall: wire.syscall,
        status: Status::from_wire(wire.status)?,
        payload: wire.payload.map_or(Payload::Empty, wire_to_payload),
    })
}

fn payload_to_wire(payload: &Payload) -> Option<WirePayload> {
    match payload {
        Payload::Empty => None,
        Payload::Cell(cell) => Some(WirePayload::Cell(WireCell {
            x: cell.x,
            y: cell.y,
            color: cell.color.clone(),
            revision: cell.revision,
            author: cell.author.clone(),
        })),
        Payload::Presence(entry) => Some(WirePayload::Presence(presence_to_wire(entry))),
        Payload::Roster(entries) => Some(WirePayload::Roster(WireRoster {
            users: entries.iter().map(presence_to_wire).collect(),
        })),
        Payload::Error(err) => Some(WirePayload::Error(WireError {
            code: err.code.clone(),
            message: err.message.clone(),
            retryable: err.retryable,
        })),
    }
}

fn wire_to_payload(wire: WirePayload) -> Payload {
    match wire {
        WirePayload::Cell(cell) => Payload::Cell(CellPayload {
            x: cell.x,
            y: cell.y,
            color: cell.color,
            revision: cell.revision,
            author: cell.author,
        }),
        WirePayload::Presence(entry) => Payload::Presence(wire_to_presence(entry)),
        WirePayload::Roster(roster) => Payload::Roster(roster.users.into_iter().map(wire_to_presence).collect()),
        WirePayload::Error(err) => Payload::Error(ErrorPayload {
            code: err.code,
            message: err.message,
            retryable: err.retryable,
        }),
    }
}

fn presence_to_wire(entry: &PresencePayload) -> WirePresence {
    WirePresence { user_id: entry.user_id.clone(), email: entry.email.clone(), seen_at: entry.seen_at }
}

fn wire_to_presence(wire: WirePresence) -> PresencePayload {
    PresencePayload { user_id: wire.user_id, email: wire.email, seen_at: wire.seen_at }
}

#[derive(Clone, PartialEq, Message)]
struct WireFrame {
    #[prost(string, tag = "1")]
    id: String,
    #[prost(string, optional, tag = "2")]
    parent_id: Option<String>,
    #[prost(int64, tag = "3")]
    ts: i64,
    #[prost(string, optional, tag = "4")]
    topic: Option<String>,
    #[prost(string, optional, tag = "5")]
    from: Option<String>,
    #[prost(string, tag = "6")]
    syscall: String,
    #[prost(enumeration = "WireFrameStatus", tag = "7")]
    status: i32,
    #[prost(oneof = "WirePayload", tags = "8, 9, 10, 11")]
    payload: Option<WirePayload>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
enum WirePayload {
    #[prost(message, tag = "8")]
    Cell(WireCell),
    #[prost(message, tag = "9")]
    Presence(WirePresence),
    #[prost(message, tag = "10")]
    Roster(WireRoster),
    #[prost(message, tag = "11")]
    Error(WireError),
}

#[derive(Clone, PartialEq, Message)]
struct WireCell {
    #[prost(sint64, tag = "1")]
    x: i64,
    #[prost(sint64, tag = "2")]
    y: i64,
    #[prost(string, tag = "3")]
    color: String,
    #[prost(uint64, tag = "4")]
    revision: u64,
    #[prost(string, optional, tag = "5")]
    author: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
struct WirePresence {
    #[prost(string, tag = "1")]
    user_id: String,
    #[prost(string, tag = "2")]
    email: String,
    #[prost(int64, tag = "3")]
    seen_at: i64,
}

#[derive(Clone, PartialEq, Message)]
struct WireRoster {
    #[prost(message, repeated, tag = "1")]
    users: Vec<WirePresence>,
}

#[derive(Clone, PartialEq, Message)]
struct WireError {
    #[prost(string, tag = "1")]
    code: String,
    #[prost(string, tag = "2")]
    message: String,
    #[prost(bool, tag = "3")]
    retryable: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
enum WireFrameStatus {
    Request = 0,
    Error = 2,
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
