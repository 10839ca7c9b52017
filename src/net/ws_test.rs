use frames::{Frame, Payload, syscall};

use super::*;

fn binary(frame: &Frame) -> WsResult {
    Ok(Message::Binary(frames::encode_frame(frame).into()))
}

#[test]
fn binary_cell_frame_becomes_event() {
    let payload = frames::CellPayload { x: 1, y: 2, color: "#ffffff".into(), revision: 1, author: None };
    let frame = Frame::request(syscall::CELL_CHANGED, Payload::Cell(payload));
    assert!(matches!(message_to_event(binary(&frame)), Some(Ok(FeedEvent::CellChanged(_)))));
}

#[test]
fn invalid_frames_are_skipped_not_fatal() {
    let payload = frames::CellPayload { x: 1, y: 2, color: "white".into(), revision: 1, author: None };
    let frame = Frame::request(syscall::CELL_CHANGED, Payload::Cell(payload));
    assert!(message_to_event(binary(&frame)).is_none());

    let handshake = Frame::request(syscall::SESSION_CONNECTED, Payload::Empty);
    assert!(message_to_event(binary(&handshake)).is_none());
}

#[test]
fn undecodable_bytes_end_the_session() {
    let got = message_to_event(Ok(Message::Binary(vec![0xFF, 0xFF, 0xFF].into())));
    assert!(matches!(got, Some(Err(TransportError::Decode(_)))));
}

#[test]
fn close_and_text_messages() {
    assert_eq!(message_to_event(Ok(Message::Close(None))), Some(Err(TransportError::Closed)));
    assert!(message_to_event(Ok(Message::Text("hello".into()))).is_none());
}

#[tokio::test]
async fn subscribe_to_unreachable_host_is_a_connect_error() {
    let realtime = WsRealtime::new("ws://127.0.0.1:1/api/ws");
    let Err(err) = realtime.subscribe().await else {
        panic!("expected connect failure");
    };
    assert!(matches!(err, TransportError::Connect(_)));
}
