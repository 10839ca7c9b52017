use super::*;

fn cell_frame() -> Frame {
    Frame {
        id: "id-1".to_owned(),
        parent_id: None,
        ts: 42,
        topic: Some(topic::CELLS.to_owned()),
        from: Some("user-1".to_owned()),
        syscall: syscall::CELL_CHANGED.to_owned(),
        status: Status::Request,
        payload: Payload::Cell(CellPayload {
            x: -3,
            y: 7,
            color: "#ff0000".to_owned(),
            revision: 12,
            author: Some("user-1".to_owned()),
        }),
    }
}

fn presence(user_id: &str) -> PresencePayload {
    PresencePayload { user_id: user_id.to_owned(), email: format!("{user_id}@uwaterloo.ca"), seen_at: 9 }
}

#[test]
fn status_wire_mapping_is_stable() {
    assert_eq!(Status::Request.as_wire() as i32, 0);
    assert_eq!(Status::Error.as_wire() as i32, 2);
}

#[test]
fn status_from_wire_rejects_out_of_range_value() {
    assert!(matches!(Status::from_wire(1), Err(CodecError::InvalidStatus(1))));
    let err = Status::from_wire(99).expect_err("status should be invalid");
    assert!(matches!(err, CodecError::InvalidStatus(99)));
}

#[test]
fn cell_frame_survives_codec_with_negative_coordinates() {
    let frame = cell_frame();
    let decoded = decode_frame(&encode_frame(&frame)).expect("decode should succeed");
    assert_eq!(decoded, frame);
}

#[test]
fn roster_frame_keeps_duplicate_entries_in_order() {
    let frame = Frame::request(
        syscall::PRESENCE_SYNC,
        Payload::Roster(vec![presence("a"), presence("a"), presence("b")]),
    )
    .with_topic(topic::PRESENCE);
    let decoded = decode_frame(&encode_frame(&frame)).expect("decode");
    let Payload::Roster(users) = decoded.payload else {
        panic!("expected roster payload");
    };
    let ids: Vec<&str> = users.iter().map(|u| u.user_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "a", "b"]);
}

#[test]
fn empty_payload_decodes_as_empty() {
    let frame = Frame::request(syscall::SESSION_CONNECTED, Payload::Empty);
    let decoded = decode_frame(&encode_frame(&frame)).expect("decode");
    assert_eq!(decoded.payload, Payload::Empty);
}

#[test]
fn decode_frame_rejects_malformed_bytes() {
    let err = decode_frame(&[0xff, 0x00, 0x01]).expect_err("bytes should fail");
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn decode_frame_rejects_invalid_wire_status() {
    let wire = WireFrame {
        id: "id-1".to_owned(),
        parent_id: None,
        ts: 1,
        topic: None,
        from: None,
        syscall: syscall::CELL_CHANGED.to_owned(),
        status: 77,
        payload: None,
    };
    let err = decode_frame(&wire.encode_to_vec()).expect_err("status should fail");
    assert!(matches!(err, CodecError::InvalidStatus(77)));
}

#[test]
fn error_reply_correlates_to_request() {
    let req = Frame::request(syscall::PRESENCE_HEARTBEAT, Payload::Presence(presence("a"))).with_topic(topic::PRESENCE);
    let err = req.error("E_UNAUTHENTICATED", "no identity", false);

    assert_eq!(err.parent_id.as_deref(), Some(req.id.as_str()));
    assert_eq!(err.status, Status::Error);
    assert_eq!(err.topic.as_deref(), Some(topic::PRESENCE));
    let Payload::Error(body) = err.payload else {
        panic!("expected error payload");
    };
    assert_eq!(body.code, "E_UNAUTHENTICATED");
    assert!(!body.retryable);
}

#[test]
fn json_shape_tags_payload_kind() {
    let json = serde_json::to_value(cell_frame()).expect("serialize");
    assert_eq!(json["payload"]["kind"], "cell");
    assert_eq!(json["payload"]["value"]["revision"], 12);
    assert_eq!(json["status"], "request");
}
