//! Edit submitter: optimistic cell edits with server reconciliation.
//!
//! DESIGN
//! ======
//! A submit puts a [`PendingEdit`] into a local overlay, sends one atomic
//! write and removes the overlay entry when the write resolves, whatever the
//! result. The authoritative grid is never written from here; the feed
//! delivers the winning record. Each pending edit carries a ticket so a
//! resolution only clears the entry it created: a newer submit to the same
//! cell, or a `cancel()`, takes ownership of that slot.
//!
//! ERROR HANDLING
//! ==============
//! Missing identity and missing selection fail before any network call.
//! Transport failures and server refusals clear the overlay and are returned
//! to the caller; writes are never retried automatically. Losing a race to a
//! concurrent writer is not an error: it is [`SubmitOutcome::Superseded`].

#[cfg(test)]
#[path = "submit_test.rs"]
mod submit_test;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::auth::Session;
use crate::backend::{CellBackend, TransportError, WriteError, WriteRequest};
use crate::color::Color;
use crate::grid::{Cell, Coord, ValidationError};
use crate::state::SharedReplica;
use crate::viewport::{Point, Viewport, ViewportError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("sign in to edit")]
    Unauthenticated,
    #[error("no cell selected")]
    NoSelection,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no cell under pointer: {0}")]
    Viewport(String),
    #[error("write failed: {0}")]
    Transport(#[from] TransportError),
    #[error("write rejected ({code}): {message}")]
    ServerRejected { code: String, message: String },
}

impl From<ViewportError> for EditError {
    fn from(e: ViewportError) -> Self {
        Self::Viewport(e.to_string())
    }
}

/// Successful resolution of a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The server accepted the write and nothing newer is known yet.
    Confirmed(Cell),
    /// Another write to the same cell won. The grid shows the winner.
    Superseded,
}

/// An unconfirmed local edit shown on top of the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub coord: Coord,
    pub color: Color,
    pub submitted_at_ms: i64,
    ticket: u64,
}

#[derive(Debug, Default)]
struct EditState {
    selection: Option<Coord>,
    overlay: HashMap<Coord, PendingEdit>,
    next_ticket: u64,
}

/// Cheap to clone; clones share selection and overlay.
#[derive(Clone)]
pub struct EditSubmitter {
    backend: Arc<dyn CellBackend>,
    session: Session,
    replica: SharedReplica,
    state: Arc<Mutex<EditState>>,
}

impl EditSubmitter {
    #[must_use]
    pub fn new(backend: Arc<dyn CellBackend>, session: Session, replica: SharedReplica) -> Self {
        Self { backend, session, replica, state: Arc::new(Mutex::new(EditState::default())) }
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Make `(x, y)` the active selection, replacing any other.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Unauthenticated`] when no identity is signed in.
    pub async fn select_cell(&self, x: i64, y: i64) -> Result<Coord, EditError> {
        if !self.session.is_authenticated() {
            return Err(EditError::Unauthenticated);
        }
        let coord = Coord::new(x, y);
        self.state.lock().await.selection = Some(coord);
        Ok(coord)
    }

    /// Select the cell under a screen point.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Unauthenticated`] or [`EditError::Viewport`].
    pub async fn select_at(&self, screen: Point, viewport: &Viewport) -> Result<Coord, EditError> {
        let coord = viewport.screen_to_grid(screen)?;
        self.select_cell(coord.x, coord.y).await
    }

    pub async fn selection(&self) -> Option<Coord> {
        self.state.lock().await.selection
    }

    /// Drop the selection and every unconfirmed overlay entry. In-flight
    /// writes still resolve but no longer touch the overlay.
    pub async fn cancel(&self) {
        let mut state = self.state.lock().await;
        state.selection = None;
        state.overlay.clear();
    }

    // =========================================================================
    // SUBMIT
    // =========================================================================

    /// Parse `raw` as a color and [`submit`](Self::submit) it.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Validation`] for malformed colors, otherwise as `submit`.
    pub async fn submit_hex(&self, raw: &str) -> Result<SubmitOutcome, EditError> {
        let color = raw.parse::<Color>()?;
        self.submit(color).await
    }

    /// Paint the selected cell.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` / `NoSelection` before any I/O; `Transport` or
    /// `ServerRejected` after the write fails. The overlay is cleared in
    /// every failure case.
    pub async fn submit(&self, color: Color) -> Result<SubmitOutcome, EditError> {
        let requester = self.session.current().ok_or(EditError::Unauthenticated)?;

        let (coord, ticket) = {
            let mut state = self.state.lock().await;
            let coord = state.selection.take().ok_or(EditError::NoSelection)?;
            state.next_ticket += 1;
            let ticket = state.next_ticket;
            let pending = PendingEdit { coord, color, submitted_at_ms: frames::now_ms(), ticket };
            state.overlay.insert(coord, pending);
            (coord, ticket)
        };

        let request = WriteRequest { x: coord.x, y: coord.y, color, requester };
        let result = self.backend.write_cell(request).await;

        {
            let mut state = self.state.lock().await;
            if state.overlay.get(&coord).is_some_and(|p| p.ticket == ticket) {
                state.overlay.remove(&coord);
            }
        }

        match result {
            Ok(cell) => {
                let newer = self
                    .replica
                    .read()
                    .await
                    .grid
                    .revision_at(coord.x, coord.y)
                    .is_some_and(|rev| rev > cell.revision);
                if newer {
                    info!(x = coord.x, y = coord.y, revision = cell.revision.0, "submit: superseded");
                    return Ok(SubmitOutcome::Superseded);
                }
                info!(x = coord.x, y = coord.y, revision = cell.revision.0, "submit: confirmed");
                Ok(SubmitOutcome::Confirmed(cell))
            }
            Err(WriteError::Conflict) => {
                info!(x = coord.x, y = coord.y, "submit: lost to concurrent write");
                Ok(SubmitOutcome::Superseded)
            }
            Err(WriteError::Rejected { code, message }) => {
                warn!(x = coord.x, y = coord.y, %code, %message, "submit: rejected");
                Err(EditError::ServerRejected { code, message })
            }
            Err(WriteError::Transport(e)) => {
                warn!(x = coord.x, y = coord.y, error = %e, "submit: transport failure");
                Err(EditError::Transport(e))
            }
        }
    }

    // =========================================================================
    // RENDERING VIEW
    // =========================================================================

    /// Every unconfirmed edit.
    pub async fn overlay(&self) -> Vec<PendingEdit> {
        let mut edits: Vec<PendingEdit> = self.state.lock().await.overlay.values().cloned().collect();
        edits.sort_by_key(|p| p.coord);
        edits
    }

    pub async fn pending_at(&self, x: i64, y: i64) -> Option<PendingEdit> {
        self.state.lock().await.overlay.get(&Coord::new(x, y)).cloned()
    }

    /// Color to draw at `(x, y)`: the pending edit if any, else the grid.
    pub async fn color_at(&self, x: i64, y: i64) -> Color {
        if let Some(pending) = self.pending_at(x, y).await {
            return pending.color;
        }
        self.replica.read().await.grid.get(x, y)
    }
}
