//! Synchronization engine for a shared, collaboratively painted pixel grid.
//!
//! Many clients paint cells on one large canvas. Each client keeps a local
//! replica of the authoritative cells, applies the server's change feed in
//! any order, shows its own edits optimistically until the server answers,
//! and tracks who else is online. Concurrent writes to one cell resolve by
//! server-assigned revision: the highest revision wins everywhere.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`grid`] | Cell records and the revision-ordered [`grid::GridStore`] |
//! | [`presence`] | Deduplicated set of connected users |
//! | [`feed`] | [`feed::ChangeFeedClient`]: catch-up, live apply, reconnect |
//! | [`submit`] | [`submit::EditSubmitter`]: selection, optimistic overlay, writes |
//! | [`viewport`] | Screen ⇄ grid transform under pan/zoom |
//! | [`state`] | Replica shared between feed and readers |
//! | [`backend`] | Collaborator traits (bulk read / atomic write, realtime) |
//! | [`net`] | HTTP and WebSocket implementations of those traits |
//! | [`auth`] | Signed-in identity handed in from outside |
//! | [`canvas`] | One client's wiring of all of the above |
//! | [`color`] | RGB color values and the default palette |
//! | [`config`] | Environment-driven settings |
//! | [`consts`] | Shared defaults (cell size, zoom limits, backoff) |

pub mod auth;
pub mod backend;
pub mod canvas;
pub mod color;
pub mod config;
pub mod consts;
pub mod feed;
pub mod grid;
pub mod net;
pub mod presence;
pub mod state;
pub mod submit;
pub mod viewport;


pub use auth::{AuthState, Identity, Session};
pub use canvas::CanvasSession;
pub use color::{Color, PALETTE};
pub use config::SyncConfig;
pub use feed::{ChangeFeedClient, ConnectionStatus, FeedConfig};
pub use grid::{Cell, Coord, GridStore, Revision, ValidationError};
pub use presence::{PresenceEntry, PresenceTracker};
pub use submit::{EditError, EditSubmitter, SubmitOutcome};
pub use viewport::{Point, Viewport};
