//! Shared replica state.
//!
//! DESIGN
//! ======
//! `Replica` bundles the authoritative grid, the presence set and the feed
//! epoch behind one `RwLock`. The feed task is the only writer of `grid` and
//! `presence`; it re-checks its epoch under the write lock before every
//! mutation, so once `disconnect()` has bumped the epoch no late event or
//! catch-up result from the old task can land.
//!
//! Readers (renderer, submitter) take the read lock briefly; nothing holds
//! the lock across an `.await`.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::backend::FeedEvent;
use crate::color::Color;
use crate::grid::{Cell, GridStore};
use crate::presence::PresenceTracker;

/// Handle shared by the feed task and every reader.
pub type SharedReplica = Arc<RwLock<Replica>>;

#[derive(Debug, Default)]
pub struct Replica {
    pub grid: GridStore,
    pub presence: PresenceTracker,
    feed_epoch: u64,
}

impl Replica {
    #[must_use]
    pub fn new(background: Color) -> Self {
        Self { grid: GridStore::new(background), presence: PresenceTracker::new(), feed_epoch: 0 }
    }

    #[must_use]
    pub fn shared(background: Color) -> SharedReplica {
        Arc::new(RwLock::new(Self::new(background)))
    }

    /// Start a new feed generation. Anything tagged with an older epoch is
    /// ignored from now on.
    pub fn begin_epoch(&mut self) -> u64 {
        self.feed_epoch += 1;
        self.feed_epoch
    }

    #[must_use]
    pub fn is_current(&self, epoch: u64) -> bool {
        self.feed_epoch == epoch
    }

    /// Apply one live event. Malformed cells never reach this point (they are
    /// rejected while decoding) but a zero revision would; it is logged and
    /// dropped.
    pub fn apply(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::CellChanged(cell) => self.apply_cell(cell),
            FeedEvent::PresenceJoined(entry) => {
                if self.presence.mark_online(entry) {
                    debug!(online = self.presence.count(), "presence: joined");
                }
            }
            FeedEvent::PresenceLeft { user_id } => {
                if self.presence.mark_offline(&user_id) {
                    debug!(online = self.presence.count(), "presence: left");
                }
            }
            FeedEvent::PresenceSync(roster) => self.presence.replace_all(roster),
        }
    }

    fn apply_cell(&mut self, cell: Cell) {
        let (x, y) = (cell.x, cell.y);
        if let Err(e) = self.grid.upsert(cell) {
            warn!(x, y, error = %e, "grid: rejected cell");
        }
    }

    /// Build a fresh grid from a catch-up baseline plus the live events that
    /// arrived while it was being fetched, then swap it in as one step.
    pub fn install_baseline(&mut self, baseline: Vec<Cell>, buffered: Vec<FeedEvent>) {
        let mut fresh = GridStore::new(self.grid.background());
        for cell in baseline {
            let (x, y) = (cell.x, cell.y);
            if let Err(e) = fresh.upsert(cell) {
                warn!(x, y, error = %e, "grid: rejected baseline cell");
            }
        }
        self.grid.replace_with(fresh);
        for event in buffered {
            self.apply(event);
        }
    }
}
