//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the authoritative cell map, the connected websocket clients
//! and the presence roster. Everything lives in memory; a restart starts
//! from an empty canvas.
//!
//! LOCK ORDER
//! ==========
//! `cells` before `clients`, `roster` before `clients`. `cells` and
//! `roster` are never held together.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use frames::{CellPayload, Frame, PresencePayload};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

/// Outgoing frame queue depth per connection.
pub const CLIENT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// ROSTER
// =============================================================================

/// One online user and the connections that announced them.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub presence: PresencePayload,
    pub connections: HashSet<Uuid>,
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is required by Axum; all inner fields
/// are Arc-wrapped.
#[derive(Clone, Default)]
pub struct AppState {
    /// Authoritative cells keyed by `(x, y)`.
    pub cells: Arc<RwLock<HashMap<(i64, i64), CellPayload>>>,
    /// Connected clients: `client_id` -> sender for outgoing frames.
    pub clients: Arc<RwLock<HashMap<Uuid, mpsc::Sender<Frame>>>>,
    /// Online users keyed by `user_id`.
    pub roster: Arc<RwLock<HashMap<String, RosterEntry>>>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return the receiving half of its queue.
    pub async fn register_client(&self, client_id: Uuid) -> mpsc::Receiver<Frame> {
        let (tx, rx) = mpsc::channel(CLIENT_CHANNEL_CAPACITY);
        self.clients.write().await.insert(client_id, tx);
        rx
    }

    pub async fn unregister_client(&self, client_id: Uuid) {
        self.clients.write().await.remove(&client_id);
    }
}

/// Offer `frame` to every connected client except `exclude` and return the
/// clients that could not take it.
///
/// A client whose queue is full (or already closed) is evicted: its sender
/// is dropped, the relay loop drains what was queued and then closes the
/// socket, and the client reconnects and catches up. The caller evicts the
/// returned IDs once it no longer holds the `clients` read lock.
#[must_use]
fn fan_out(clients: &HashMap<Uuid, mpsc::Sender<Frame>>, frame: &Frame, exclude: Option<Uuid>) -> Vec<Uuid> {
    let mut lagging = Vec::new();
    for (client_id, tx) in clients {
        if exclude == Some(*client_id) {
            continue;
        }
        if let Err(e) = tx.try_send(frame.clone()) {
            tracing::warn!(%client_id, syscall = %frame.syscall, error = %e, "broadcast: evicting lagging client");
            lagging.push(*client_id);
        }
    }
    lagging
}

impl AppState {
    /// Queue `frame` for every connected client except `exclude`, evicting
    /// clients that cannot keep up.
    pub async fn broadcast(&self, frame: &Frame, exclude: Option<Uuid>) {
        let lagging = fan_out(&*self.clients.read().await, frame, exclude);
        if lagging.is_empty() {
            return;
        }
        let mut clients = self.clients.write().await;
        for client_id in lagging {
            clients.remove(&client_id);
        }
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;
