use std::time::Duration;

use super::*;
use crate::auth::Identity;
use crate::backend::FeedEvent;
use crate::fakes_test::{FakeBackend, FakeRealtime, WAIT, cell};
use crate::submit::SubmitOutcome;

const RED: Color = Color::from_rgb(0xFF, 0, 0);

fn session(backend: Arc<FakeBackend>, realtime: Arc<FakeRealtime>) -> CanvasSession {
    let config = SyncConfig { heartbeat_interval: Duration::from_secs(60), ..SyncConfig::default() };
    let auth = AuthState::signed_in(Identity::new("u1", "u1@uwaterloo.ca"));
    CanvasSession::with_collaborators(&config, auth, backend, realtime).expect("session")
}

async fn wait_live(session: &CanvasSession) {
    let mut rx = session.status();
    tokio::time::timeout(WAIT, rx.wait_for(|s| *s == ConnectionStatus::Live))
        .await
        .expect("timeout")
        .expect("status");
}

#[tokio::test]
async fn click_then_submit_round_trips_through_the_feed() {
    let backend = Arc::new(FakeBackend::default());
    let realtime = Arc::new(FakeRealtime::default());
    let mut session = session(backend.clone(), realtime.clone());
    session.start().await;
    wait_live(&session).await;

    let coord = session.click(Point::new(15.0, 5.0)).await.expect("click");
    assert_eq!(coord, Coord::new(1, 0));
    let Ok(SubmitOutcome::Confirmed(written)) = session.submitter().submit(RED).await else {
        panic!("write not confirmed");
    };
    assert!(session.snapshot_all().await.is_empty());

    // The server broadcasts the confirmed write back to everyone.
    realtime.push(FeedEvent::CellChanged(written));
    for _ in 0..200 {
        if session.cell_count().await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(session.snapshot_all().await.get(&coord), Some(&RED));
    assert_eq!(session.submitter().color_at(1, 0).await, RED);
}

#[tokio::test]
async fn stop_clears_presence() {
    let backend = Arc::new(FakeBackend::with_cells([cell(0, 0, RED, 1)]));
    let realtime = Arc::new(FakeRealtime::default());
    let mut session = session(backend, realtime.clone());
    session.start().await;
    wait_live(&session).await;
    assert_eq!(session.cell_count().await, 1);

    realtime.push(FeedEvent::PresenceJoined(crate::presence::PresenceEntry {
        user_id: "u2".into(),
        email: "u2@uwaterloo.ca".into(),
        last_seen_ms: 1,
    }));
    for _ in 0..200 {
        if session.online_count().await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(session.online().await[0].user_id, "u2");

    session.stop().await;
    assert_eq!(session.online_count().await, 0);
    assert_eq!(*session.status().borrow(), ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn viewport_changes_affect_click_mapping() {
    let mut session = session(Arc::new(FakeBackend::default()), Arc::new(FakeRealtime::default()));
    session.viewport_mut().set_zoom(2.0).expect("zoom");
    assert_eq!(session.click(Point::new(15.0, 5.0)).await, Ok(Coord::new(0, 0)));

    session.auth().sign_out();
    assert_eq!(session.click(Point::new(15.0, 5.0)).await, Err(EditError::Unauthenticated));
}

#[test]
fn invalid_geometry_is_rejected() {
    let config = SyncConfig { cell_size: 0.0, ..SyncConfig::default() };
    let result = CanvasSession::with_collaborators(
        &config,
        AuthState::new(),
        Arc::new(FakeBackend::default()),
        Arc::new(FakeRealtime::default()),
    );
    assert!(matches!(result, Err(SessionError::Viewport(ViewportError::InvalidCellSize(_)))));
}
