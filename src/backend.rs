//! Collaborator seams: persistence/RPC and realtime.
//!
//! DESIGN
//! ======
//! The engine never talks to the network directly. [`CellBackend`] is the
//! bulk-read + atomic-write RPC, [`Realtime`] the broadcast subscription. The
//! HTTP/WebSocket implementations live in [`crate::net`]; tests substitute
//! in-memory fakes.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures are [`TransportError`] (recoverable: the feed
//! reconnects, the submitter surfaces it). The write RPC adds [`WriteError`]
//! for the server's typed refusals.

use std::pin::Pin;

use futures_util::Stream;
use tokio::sync::mpsc;

use crate::auth::Identity;
use crate::color::Color;
use crate::grid::Cell;
use crate::presence::PresenceEntry;

// =============================================================================
// ERRORS
// =============================================================================

/// Connection-level failure. Cloneable so a single cause can be both logged
/// and reported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("connection closed")]
    Closed,
    #[error("request timed out")]
    Timeout,
    #[error("send failed: {0}")]
    Send(String),
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}

impl From<frames::CodecError> for TransportError {
    fn from(e: frames::CodecError) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Failure of the atomic write RPC.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    /// The server ordered a competing write after ours; ours did not land.
    #[error("write lost to a concurrent write")]
    Conflict,
    #[error("write rejected ({code}): {message}")]
    Rejected { code: String, message: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

// =============================================================================
// PERSISTENCE / RPC
// =============================================================================

/// Arguments of one atomic cell write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub x: i64,
    pub y: i64,
    pub color: Color,
    pub requester: Identity,
}

#[async_trait::async_trait]
pub trait CellBackend: Send + Sync {
    /// Every known cell.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the read cannot complete.
    async fn fetch_all(&self) -> Result<Vec<Cell>, TransportError>;

    /// Atomically write one cell; the server assigns the revision.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError`] on conflict, refusal, or transport failure.
    async fn write_cell(&self, request: WriteRequest) -> Result<Cell, WriteError>;
}

// =============================================================================
// REALTIME
// =============================================================================

/// One typed event from the realtime subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    CellChanged(Cell),
    PresenceJoined(PresenceEntry),
    PresenceLeft { user_id: String },
    PresenceSync(Vec<PresenceEntry>),
}

/// Live events. An `Err` item or the end of the stream means the connection
/// is gone.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<FeedEvent, TransportError>> + Send>>;

/// Outbound presence announcements for one subscription.
#[derive(Debug, Clone)]
pub struct HeartbeatSink {
    tx: mpsc::UnboundedSender<Identity>,
}

impl HeartbeatSink {
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<Identity>) -> Self {
        Self { tx }
    }

    /// Queue a presence heartbeat for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] when the connection's writer is gone.
    pub fn publish(&self, identity: &Identity) -> Result<(), TransportError> {
        self.tx.send(identity.clone()).map_err(|_| TransportError::Closed)
    }
}

/// An open realtime connection: inbound events plus the outbound heartbeat
/// channel. Dropping it closes the connection.
pub struct Subscription {
    pub events: EventStream,
    pub heartbeats: HeartbeatSink,
}

#[async_trait::async_trait]
pub trait Realtime: Send + Sync {
    /// Open a subscription to the cell and presence topics.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the connection cannot be established.
    async fn subscribe(&self) -> Result<Subscription, TransportError>;
}
