//! Canvas session: one client's wiring of the engine parts.
//!
//! SYSTEM CONTEXT
//! ==============
//! A renderer (or the CLI) owns one `CanvasSession`. It shares a single
//! replica between the feed (writer) and the submitter (reader), hands both
//! the same auth session, and keeps the local viewport.

#[cfg(test)]
#[path = "canvas_test.rs"]
mod canvas_test;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::AuthState;
use crate::backend::{CellBackend, Realtime, TransportError};
use crate::color::Color;
use crate::config::SyncConfig;
use crate::feed::{ChangeFeedClient, ConnectionStatus};
use crate::grid::Coord;
use crate::net::{HttpCellBackend, WsRealtime};
use crate::presence::PresenceEntry;
use crate::state::{Replica, SharedReplica};
use crate::submit::{EditError, EditSubmitter};
use crate::viewport::{Point, Viewport, ViewportError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Viewport(#[from] ViewportError),
}

pub struct CanvasSession {
    auth: AuthState,
    replica: SharedReplica,
    feed: ChangeFeedClient,
    submitter: EditSubmitter,
    viewport: Viewport,
}

impl CanvasSession {
    /// Session backed by the HTTP + WebSocket collaborators at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the HTTP client cannot be built or the
    /// configured geometry is invalid.
    pub fn connect_to(config: &SyncConfig, auth: AuthState) -> Result<Self, SessionError> {
        let backend = Arc::new(HttpCellBackend::new(config.cells_url(), config.request_timeout)?);
        let realtime = Arc::new(WsRealtime::new(config.ws_url()));
        Self::with_collaborators(config, auth, backend, realtime)
    }

    /// # Errors
    ///
    /// Returns [`SessionError::Viewport`] if the configured geometry is invalid.
    pub fn with_collaborators(
        config: &SyncConfig,
        auth: AuthState,
        backend: Arc<dyn CellBackend>,
        realtime: Arc<dyn Realtime>,
    ) -> Result<Self, SessionError> {
        let viewport = config.viewport()?;
        let replica = Replica::shared(Color::WHITE);
        let feed = ChangeFeedClient::new(
            Arc::clone(&backend),
            realtime,
            auth.session(),
            Arc::clone(&replica),
            config.feed(),
        );
        let submitter = EditSubmitter::new(backend, auth.session(), Arc::clone(&replica));
        Ok(Self { auth, replica, feed, submitter, viewport })
    }

    pub async fn start(&mut self) {
        self.feed.connect().await;
    }

    pub async fn stop(&mut self) {
        self.feed.disconnect().await;
    }

    #[must_use]
    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    #[must_use]
    pub fn submitter(&self) -> &EditSubmitter {
        &self.submitter
    }

    #[must_use]
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.feed.status()
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Select the cell under a pointer position in the current viewport.
    ///
    /// # Errors
    ///
    /// Returns [`EditError`] when signed out or the point is off-grid.
    pub async fn click(&self, screen: Point) -> Result<Coord, EditError> {
        self.submitter.select_at(screen, &self.viewport).await
    }

    /// Authoritative colors, for an initial render.
    pub async fn snapshot_all(&self) -> HashMap<Coord, Color> {
        self.replica.read().await.grid.snapshot_all()
    }

    pub async fn cell_count(&self) -> usize {
        self.replica.read().await.grid.len()
    }

    pub async fn online_count(&self) -> usize {
        self.replica.read().await.presence.count()
    }

    pub async fn online(&self) -> Vec<PresenceEntry> {
        self.replica.read().await.presence.list()
    }
}
