//! Frame ⇄ feed event mapping for the realtime wire protocol.
//!
//! Pure functions so the decoding rules are testable without a socket.

#[cfg(test)]
#[path = "parse_test.rs"]
mod parse_test;

use frames::{Frame, Payload, Status, syscall, topic};

use crate::auth::Identity;
use crate::backend::FeedEvent;
use crate::grid::{Cell, ValidationError};
use crate::presence::PresenceEntry;

/// Map an inbound frame to a feed event.
///
/// Returns `Ok(None)` for frames the engine does not act on (session
/// handshake, replies, unknown syscalls).
///
/// # Errors
///
/// Returns [`ValidationError`] when a known syscall carries the wrong payload
/// or an invalid cell.
pub fn frame_to_event(frame: &Frame) -> Result<Option<FeedEvent>, ValidationError> {
    if frame.status == Status::Error {
        return Ok(None);
    }
    let unexpected = || ValidationError::UnexpectedPayload(frame.syscall.clone());
    let event = match frame.syscall.as_str() {
        syscall::CELL_CHANGED => match &frame.payload {
            Payload::Cell(payload) => FeedEvent::CellChanged(Cell::try_from(payload.clone())?),
            _ => return Err(unexpected()),
        },
        syscall::PRESENCE_JOIN => match &frame.payload {
            Payload::Presence(payload) => FeedEvent::PresenceJoined(PresenceEntry::from(payload.clone())),
            _ => return Err(unexpected()),
        },
        syscall::PRESENCE_LEAVE => match &frame.payload {
            Payload::Presence(payload) if !payload.user_id.is_empty() => {
                FeedEvent::PresenceLeft { user_id: payload.user_id.clone() }
            }
            Payload::Presence(_) => return Err(ValidationError::MissingField("user_id")),
            _ => return Err(unexpected()),
        },
        syscall::PRESENCE_SYNC => match &frame.payload {
            Payload::Roster(users) => {
                FeedEvent::PresenceSync(users.iter().cloned().map(PresenceEntry::from).collect())
            }
            _ => return Err(unexpected()),
        },
        _ => return Ok(None),
    };
    Ok(Some(event))
}

/// Outbound presence announcement for `identity`.
#[must_use]
pub fn heartbeat_frame(identity: &Identity) -> Frame {
    let payload = frames::PresencePayload {
        user_id: identity.user_id.clone(),
        email: identity.email.clone(),
        seen_at: frames::now_ms(),
    };
    Frame::request(syscall::PRESENCE_HEARTBEAT, Payload::Presence(payload))
        .with_topic(topic::PRESENCE)
        .with_from(identity.user_id.clone())
}
