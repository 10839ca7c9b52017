//! Change feed client: keeps the replica in step with the server.
//!
//! DESIGN
//! ======
//! `ChangeFeedClient` owns one background task per connection generation.
//! Each session of that task:
//!
//! 1. subscribes to the realtime collaborator,
//! 2. announces presence (when signed in),
//! 3. runs the bulk catch-up fetch while buffering live events,
//! 4. builds a fresh grid from the baseline, replays the buffer on top and
//!    swaps it in under one write lock,
//! 5. applies live events until the stream fails.
//!
//! Any transport failure ends the session; the task backs off (doubling,
//! capped) and starts again from step 1. There is no resume cursor.
//!
//! CANCELLATION
//! ============
//! `disconnect()` bumps the replica epoch under the write lock before
//! aborting the task. The task checks its epoch under the same lock before
//! every mutation and status change, so nothing from the old generation is
//! observable once `disconnect()` returns. Dropping the client does the same
//! on a best-effort basis.

#[cfg(test)]
#[path = "feed_test.rs"]
mod feed_test;

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::auth::Session;
use crate::backend::{CellBackend, EventStream, FeedEvent, HeartbeatSink, Realtime, Subscription, TransportError};
use crate::consts::{HEARTBEAT_SECS, RECONNECT_MAX_MS, RECONNECT_MIN_MS};
use crate::grid::Cell;
use crate::state::SharedReplica;

/// Timing knobs for the feed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    pub reconnect_min: Duration,
    pub reconnect_max: Duration,
    pub heartbeat_interval: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            reconnect_min: Duration::from_millis(RECONNECT_MIN_MS),
            reconnect_max: Duration::from_millis(RECONNECT_MAX_MS),
            heartbeat_interval: Duration::from_secs(HEARTBEAT_SECS),
        }
    }
}

/// Lifecycle of the feed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    /// Subscribed; bulk read in flight, live events are being buffered.
    CatchingUp,
    Live,
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct ChangeFeedClient {
    backend: Arc<dyn CellBackend>,
    realtime: Arc<dyn Realtime>,
    session: Session,
    replica: SharedReplica,
    config: FeedConfig,
    status: Arc<watch::Sender<ConnectionStatus>>,
    task: Option<JoinHandle<()>>,
}

impl ChangeFeedClient {
    #[must_use]
    pub fn new(
        backend: Arc<dyn CellBackend>,
        realtime: Arc<dyn Realtime>,
        session: Session,
        replica: SharedReplica,
        config: FeedConfig,
    ) -> Self {
        let (status, _rx) = watch::channel(ConnectionStatus::Disconnected);
        Self { backend, realtime, session, replica, config, status: Arc::new(status), task: None }
    }

    /// Start (or restart) the feed. A running generation is torn down first.
    pub async fn connect(&mut self) {
        self.disconnect().await;

        let epoch = self.replica.write().await.begin_epoch();
        let task = FeedTask {
            backend: Arc::clone(&self.backend),
            realtime: Arc::clone(&self.realtime),
            session: self.session.clone(),
            replica: Arc::clone(&self.replica),
            config: self.config,
            status: Arc::clone(&self.status),
            epoch,
        };
        info!(epoch, "feed: connect");
        self.task = Some(tokio::spawn(task.run()));
    }

    /// Stop the feed. Safe at any point, including mid catch-up; no mutation
    /// from the stopped generation happens after this returns. Presence is
    /// cleared since it has no source without a live channel.
    pub async fn disconnect(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        {
            let mut replica = self.replica.write().await;
            replica.begin_epoch();
            replica.presence.clear();
            self.status.send_replace(ConnectionStatus::Disconnected);
        }
        task.abort();
        info!("feed: disconnected");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Watch the connection status.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    #[must_use]
    pub fn replica(&self) -> SharedReplica {
        Arc::clone(&self.replica)
    }
}

impl Drop for ChangeFeedClient {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            if let Ok(mut replica) = self.replica.try_write() {
                replica.begin_epoch();
                replica.presence.clear();
            }
            task.abort();
        }
    }
}

// =============================================================================
// TASK
// =============================================================================

enum SessionEnd {
    /// The generation was superseded; exit without touching anything.
    Cancelled,
    Transport(TransportError),
}

struct FeedTask {
    backend: Arc<dyn CellBackend>,
    realtime: Arc<dyn Realtime>,
    session: Session,
    replica: SharedReplica,
    config: FeedConfig,
    status: Arc<watch::Sender<ConnectionStatus>>,
    epoch: u64,
}

impl FeedTask {
    async fn run(self) {
        let mut backoff = self.config.reconnect_min;
        loop {
            if !self.set_status(ConnectionStatus::Connecting).await {
                return;
            }
            match self.run_session(&mut backoff).await {
                SessionEnd::Cancelled => return,
                SessionEnd::Transport(e) => {
                    warn!(error = %e, retry_in = ?backoff, "feed: connection lost");
                }
            }
            if !self.mark_dropped().await {
                return;
            }
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(self.config.reconnect_max);
        }
    }

    async fn run_session(&self, backoff: &mut Duration) -> SessionEnd {
        let Subscription { mut events, heartbeats } = match self.realtime.subscribe().await {
            Ok(subscription) => subscription,
            Err(e) => return SessionEnd::Transport(e),
        };
        if !self.set_status(ConnectionStatus::CatchingUp).await {
            return SessionEnd::Cancelled;
        }
        if let Err(e) = self.heartbeat(&heartbeats) {
            return SessionEnd::Transport(e);
        }

        let (baseline, buffered) = match self.catch_up(&mut events).await {
            Ok(loaded) => loaded,
            Err(e) => return SessionEnd::Transport(e),
        };
        let (cells, pending) = (baseline.len(), buffered.len());
        {
            let mut replica = self.replica.write().await;
            if !replica.is_current(self.epoch) {
                return SessionEnd::Cancelled;
            }
            replica.install_baseline(baseline, buffered);
            self.status.send_replace(ConnectionStatus::Live);
        }
        info!(cells, buffered = pending, "feed: live");
        *backoff = self.config.reconnect_min;

        self.stream_live(&mut events, &heartbeats).await
    }

    /// Run the bulk read, collecting live events that arrive meanwhile.
    async fn catch_up(&self, events: &mut EventStream) -> Result<(Vec<Cell>, Vec<FeedEvent>), TransportError> {
        let mut buffered = Vec::new();
        let mut fetch = self.backend.fetch_all();
        loop {
            tokio::select! {
                baseline = &mut fetch => return Ok((baseline?, buffered)),
                event = events.next() => match event {
                    Some(Ok(event)) => buffered.push(event),
                    Some(Err(e)) => return Err(e),
                    None => return Err(TransportError::Closed),
                },
            }
        }
    }

    async fn stream_live(&self, events: &mut EventStream, heartbeats: &HeartbeatSink) -> SessionEnd {
        let mut ticker = tokio::time::interval(self.config.heartbeat_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately; presence was announced on subscribe.
        ticker.tick().await;

        loop {
            tokio::select! {
                event = events.next() => match event {
                    Some(Ok(event)) => {
                        let mut replica = self.replica.write().await;
                        if !replica.is_current(self.epoch) {
                            return SessionEnd::Cancelled;
                        }
                        replica.apply(event);
                    }
                    Some(Err(e)) => return SessionEnd::Transport(e),
                    None => return SessionEnd::Transport(TransportError::Closed),
                },
                _ = ticker.tick() => {
                    if let Err(e) = self.heartbeat(heartbeats) {
                        return SessionEnd::Transport(e);
                    }
                }
            }
        }
    }

    fn heartbeat(&self, heartbeats: &HeartbeatSink) -> Result<(), TransportError> {
        match self.session.current() {
            Some(identity) => {
                debug!(user_id = %identity.user_id, "feed: heartbeat");
                heartbeats.publish(&identity)
            }
            None => Ok(()),
        }
    }

    /// Publish `status` if this generation is still current.
    async fn set_status(&self, status: ConnectionStatus) -> bool {
        let replica = self.replica.read().await;
        if !replica.is_current(self.epoch) {
            return false;
        }
        self.status.send_replace(status);
        true
    }

    /// Record a lost connection: presence is unknown until the next sync.
    async fn mark_dropped(&self) -> bool {
        let mut replica = self.replica.write().await;
        if !replica.is_current(self.epoch) {
            return false;
        }
        replica.presence.clear();
        self.status.send_replace(ConnectionStatus::Disconnected);
        true
    }
}
