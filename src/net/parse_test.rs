use super::*;
use crate::color::Color;
use crate::grid::Revision;

fn cell_frame(color: &str, revision: u64) -> Frame {
    let payload = frames::CellPayload { x: -3, y: 7, color: color.to_owned(), revision, author: Some("u9".into()) };
    Frame::request(syscall::CELL_CHANGED, Payload::Cell(payload)).with_topic(topic::CELLS)
}

fn presence(user_id: &str) -> frames::PresencePayload {
    frames::PresencePayload { user_id: user_id.to_owned(), email: format!("{user_id}@x.io"), seen_at: 5 }
}

#[test]
fn cell_changed_becomes_cell_event() {
    let event = frame_to_event(&cell_frame("#0000ff", 4)).expect("valid").expect("event");
    let FeedEvent::CellChanged(cell) = event else {
        panic!("expected cell event, got {event:?}");
    };
    assert_eq!((cell.x, cell.y), (-3, 7));
    assert_eq!(cell.color, Color::from_rgb(0, 0, 0xFF));
    assert_eq!(cell.revision, Revision(4));
    assert_eq!(cell.author.as_deref(), Some("u9"));
}

#[test]
fn invalid_cell_payloads_are_rejected() {
    assert!(matches!(frame_to_event(&cell_frame("blue", 4)), Err(ValidationError::InvalidColor(_))));
    assert!(matches!(frame_to_event(&cell_frame("#0000ff", 0)), Err(ValidationError::ZeroRevision { .. })));
}

#[test]
fn wrong_payload_kind_is_rejected() {
    let frame = Frame::request(syscall::CELL_CHANGED, Payload::Presence(presence("a")));
    assert_eq!(frame_to_event(&frame), Err(ValidationError::UnexpectedPayload("cell:changed".into())));
}

#[test]
fn presence_frames_map_to_presence_events() {
    let join = Frame::request(syscall::PRESENCE_JOIN, Payload::Presence(presence("a")));
    assert!(matches!(frame_to_event(&join), Ok(Some(FeedEvent::PresenceJoined(e))) if e.user_id == "a"));

    let leave = Frame::request(syscall::PRESENCE_LEAVE, Payload::Presence(presence("a")));
    assert_eq!(frame_to_event(&leave), Ok(Some(FeedEvent::PresenceLeft { user_id: "a".into() })));

    let sync = Frame::request(syscall::PRESENCE_SYNC, Payload::Roster(vec![presence("a"), presence("a"), presence("b")]));
    let Ok(Some(FeedEvent::PresenceSync(roster))) = frame_to_event(&sync) else {
        panic!("expected roster");
    };
    assert_eq!(roster.len(), 3);
    assert_eq!(roster[0].last_seen_ms, 5);
}

#[test]
fn leave_without_user_id_is_rejected() {
    let leave = Frame::request(syscall::PRESENCE_LEAVE, Payload::Presence(presence("")));
    assert_eq!(frame_to_event(&leave), Err(ValidationError::MissingField("user_id")));
}

#[test]
fn handshake_errors_and_unknown_syscalls_are_ignored() {
    let connected = Frame::request(syscall::SESSION_CONNECTED, Payload::Empty);
    assert_eq!(frame_to_event(&connected), Ok(None));

    let error = connected.error("E_RATE_LIMITED", "slow down", true);
    assert_eq!(frame_to_event(&error), Ok(None));

    let unknown = Frame::request("board:join", Payload::Empty);
    assert_eq!(frame_to_event(&unknown), Ok(None));
}

#[test]
fn heartbeat_frame_announces_identity_on_presence_topic() {
    let me = Identity::new("u1", "u1@uwaterloo.ca");
    let frame = heartbeat_frame(&me);
    assert_eq!(frame.syscall, syscall::PRESENCE_HEARTBEAT);
    assert_eq!(frame.topic.as_deref(), Some(topic::PRESENCE));
    assert_eq!(frame.from.as_deref(), Some("u1"));
    let Payload::Presence(payload) = frame.payload else {
        panic!("expected presence payload");
    };
    assert_eq!(payload.email, "u1@uwaterloo.ca");
    assert!(payload.seen_at > 0);
}
