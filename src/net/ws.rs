//! WebSocket realtime client.
//!
//! One socket per subscription. Inbound binary messages are protobuf frames
//! mapped through [`frame_to_event`]; frames that fail validation are logged
//! and skipped. A writer task turns queued heartbeats into frames and stops
//! when the subscription is dropped.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::parse::{frame_to_event, heartbeat_frame};
use crate::backend::{FeedEvent, HeartbeatSink, Realtime, Subscription, TransportError};

pub struct WsRealtime {
    ws_url: String,
}

impl WsRealtime {
    #[must_use]
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self { ws_url: ws_url.into() }
    }
}

#[async_trait::async_trait]
impl Realtime for WsRealtime {
    async fn subscribe(&self) -> Result<Subscription, TransportError> {
        let (stream, _) = connect_async(self.ws_url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        info!(url = %self.ws_url, "ws: connected");
        let (mut sink, stream) = stream.split();

        let (tx, mut rx) = mpsc::unbounded_channel::<crate::auth::Identity>();
        tokio::spawn(async move {
            while let Some(identity) = rx.recv().await {
                let bytes = frames::encode_frame(&heartbeat_frame(&identity));
                if let Err(e) = sink.send(Message::Binary(bytes.into())).await {
                    debug!(error = %e, "ws: heartbeat send failed");
                    break;
                }
            }
            if let Err(e) = sink.close().await {
                debug!(error = %e, "ws: close failed");
            }
        });

        let events = stream.filter_map(|message| async move { message_to_event(message) });
        Ok(Subscription { events: Box::pin(events), heartbeats: HeartbeatSink::new(tx) })
    }
}

type WsResult = Result<Message, tokio_tungstenite::tungstenite::Error>;

/// `None` skips the message; `Some(Err)` ends the session.
fn message_to_event(message: WsResult) -> Option<Result<FeedEvent, TransportError>> {
    match message {
        Ok(Message::Binary(bytes)) => match frames::decode_frame(&bytes) {
            Ok(frame) => match frame_to_event(&frame) {
                Ok(event) => event.map(Ok),
                Err(e) => {
                    warn!(syscall = %frame.syscall, error = %e, "ws: dropping invalid frame");
                    None
                }
            },
            Err(e) => Some(Err(TransportError::from(e))),
        },
        Ok(Message::Close(_)) => Some(Err(TransportError::Closed)),
        Ok(_) => None,
        Err(e) => Some(Err(TransportError::Protocol(e.to_string()))),
    }
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod ws_test;
