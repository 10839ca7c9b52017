use frames::{Payload, syscall};

use super::*;

#[tokio::test]
async fn broadcast_skips_excluded_client() {
    let state = AppState::new();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let mut rx_a = state.register_client(a).await;
    let mut rx_b = state.register_client(b).await;

    let frame = Frame::request(syscall::CELL_CHANGED, Payload::Empty);
    state.broadcast(&frame, Some(a)).await;

    assert!(rx_a.try_recv().is_err());
    assert_eq!(rx_b.try_recv().expect("b receives").id, frame.id);
}

#[tokio::test]
async fn unregistered_client_receives_nothing() {
    let state = AppState::new();
    let a = Uuid::new_v4();
    let mut rx = state.register_client(a).await;
    state.unregister_client(a).await;

    state.broadcast(&Frame::request("x:y", Payload::Empty), None).await;
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn full_queue_evicts_client_after_draining() {
    let state = AppState::new();
    let slow = Uuid::new_v4();
    let fast = Uuid::new_v4();
    let mut slow_rx = state.register_client(slow).await;
    let mut fast_rx = state.register_client(fast).await;

    let frame = Frame::request(syscall::CELL_CHANGED, Payload::Empty);
    for _ in 0..CLIENT_CHANNEL_CAPACITY {
        state.broadcast(&frame, None).await;
        assert!(fast_rx.try_recv().is_ok());
    }
    assert!(state.clients.read().await.contains_key(&slow));

    // One more than the queue holds: the slow client is dropped, the fast one kept.
    state.broadcast(&frame, None).await;
    assert!(!state.clients.read().await.contains_key(&slow));
    assert!(state.clients.read().await.contains_key(&fast));

    let mut drained = 0;
    while slow_rx.recv().await.is_some() {
        drained += 1;
    }
    assert_eq!(drained, CLIENT_CHANNEL_CAPACITY);
}

#[test]
fn fan_out_reports_closed_receivers() {
    let (tx, rx) = mpsc::channel(1);
    drop(rx);
    let gone = Uuid::new_v4();
    let clients = HashMap::from([(gone, tx)]);

    let lagging = fan_out(&clients, &Frame::request("x:y", Payload::Empty), None);
    assert_eq!(lagging, vec![gone]);
}
