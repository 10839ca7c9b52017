//! Presence service: roster of online users keyed by `user_id`.
//!
//! DESIGN
//! ======
//! A user may be connected from several sockets. The roster counts the
//! connections that announced each user: the first heartbeat broadcasts
//! `presence:join` to the others, and `presence:leave` goes out only when
//! the user's last connection is released. Every new connection and every
//! heartbeat is answered with a `presence:sync` carrying the whole roster.

use std::collections::HashMap;

use frames::{Frame, Payload, PresencePayload, now_ms, syscall, topic};
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::{AppState, RosterEntry};

#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error("heartbeat must name a user")]
    MissingUser,
}

impl crate::error::ErrorCode for PresenceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingUser => "E_UNAUTHENTICATED",
        }
    }
}

/// Record a heartbeat from `client_id` and return the current roster,
/// sorted by `user_id`.
///
/// # Errors
///
/// Returns `MissingUser` when the payload carries an empty `user_id`.
pub async fn heartbeat(
    state: &AppState,
    client_id: Uuid,
    mut presence: PresencePayload,
) -> Result<Vec<PresencePayload>, PresenceError> {
    if presence.user_id.trim().is_empty() {
        return Err(PresenceError::MissingUser);
    }
    presence.seen_at = now_ms();

    let mut roster = state.roster.write().await;
    let joined = match roster.get_mut(&presence.user_id) {
        Some(entry) => {
            let first_from_client = entry.connections.insert(client_id);
            entry.presence = presence.clone();
            debug!(%client_id, user_id = %presence.user_id, first_from_client, "presence: heartbeat");
            false
        }
        None => {
            let entry = RosterEntry { presence: presence.clone(), connections: [client_id].into() };
            roster.insert(presence.user_id.clone(), entry);
            true
        }
    };

    if joined {
        info!(%client_id, user_id = %presence.user_id, "presence: join");
        let frame =
            Frame::request(syscall::PRESENCE_JOIN, Payload::Presence(presence.clone())).with_topic(topic::PRESENCE);
        state.broadcast(&frame, Some(client_id)).await;
    }

    Ok(sorted(&roster))
}

/// Current roster, sorted by `user_id`. Sent to every new connection so
/// watchers that never announce themselves still see who is online.
pub async fn roster(state: &AppState) -> Vec<PresencePayload> {
    sorted(&*state.roster.read().await)
}

fn sorted(roster: &HashMap<String, RosterEntry>) -> Vec<PresencePayload> {
    let mut list: Vec<PresencePayload> = roster.values().map(|entry| entry.presence.clone()).collect();
    list.sort_by(|a, b| a.user_id.cmp(&b.user_id));
    list
}

/// Drop `client_id` from `user_id`'s connections. Returns `true` and
/// broadcasts `presence:leave` when that was the user's last connection.
pub async fn release(state: &AppState, client_id: Uuid, user_id: &str) -> bool {
    let mut roster = state.roster.write().await;
    let Some(entry) = roster.get_mut(user_id) else {
        return false;
    };
    entry.connections.remove(&client_id);
    if !entry.connections.is_empty() {
        return false;
    }
    let Some(entry) = roster.remove(user_id) else {
        return false;
    };

    info!(%client_id, %user_id, "presence: leave");
    let frame = Frame::request(syscall::PRESENCE_LEAVE, Payload::Presence(entry.presence)).with_topic(topic::PRESENCE);
    state.broadcast(&frame, Some(client_id)).await;
    true
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod presence_test;
