use uuid::Uuid;

use super::*;
use crate::error::ErrorCode;

fn write(x: i64, y: i64, color: &str, user: &str) -> WriteCell {
    WriteCell { x, y, color: color.into(), user_id: user.into() }
}

#[tokio::test]
async fn first_write_gets_revision_one() {
    let state = AppState::new();
    let cell = write_cell(&state, write(3, 4, "#FF0000", "u1")).await.expect("write");
    assert_eq!(cell.revision, 1);
    assert_eq!(cell.color, "#ff0000");
    assert_eq!(cell.author.as_deref(), Some("u1"));
}

#[tokio::test]
async fn revisions_are_per_coordinate() {
    let state = AppState::new();
    write_cell(&state, write(0, 0, "#000", "u1")).await.expect("write");
    let second = write_cell(&state, write(0, 0, "#fff", "u2")).await.expect("write");
    let other = write_cell(&state, write(1, 0, "#fff", "u2")).await.expect("write");
    assert_eq!(second.revision, 2);
    assert_eq!(other.revision, 1);
}

#[tokio::test]
async fn concurrent_writes_get_distinct_revisions() {
    let state = AppState::new();
    let mut handles = Vec::new();
    for i in 0..16 {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            write_cell(&state, write(7, 7, "#123456", &format!("u{i}"))).await.expect("write").revision
        }));
    }
    let mut revisions = Vec::new();
    for handle in handles {
        revisions.push(handle.await.expect("join"));
    }
    revisions.sort_unstable();
    assert_eq!(revisions, (1..=16).collect::<Vec<u64>>());
    assert_eq!(list_cells(&state).await[0].revision, 16);
}

#[tokio::test]
async fn write_broadcasts_cell_changed_in_revision_order() {
    let state = AppState::new();
    let mut rx = state.register_client(Uuid::new_v4()).await;

    write_cell(&state, write(2, 2, "#00ff00", "u1")).await.expect("write");
    write_cell(&state, write(2, 2, "#0000ff", "u1")).await.expect("write");

    for expected in 1..=2 {
        let frame = rx.recv().await.expect("broadcast");
        assert_eq!(frame.syscall, syscall::CELL_CHANGED);
        assert_eq!(frame.topic.as_deref(), Some(topic::CELLS));
        let Payload::Cell(cell) = frame.payload else { panic!("expected cell payload") };
        assert_eq!(cell.revision, expected);
    }
}

#[tokio::test]
async fn anonymous_write_is_refused() {
    let state = AppState::new();
    let err = write_cell(&state, write(0, 0, "#fff", " ")).await.expect_err("anonymous");
    assert_eq!(err.error_code(), "E_UNAUTHENTICATED");
    assert!(list_cells(&state).await.is_empty());
}

#[tokio::test]
async fn bad_color_is_refused() {
    let state = AppState::new();
    let err = write_cell(&state, write(0, 0, "purple", "u1")).await.expect_err("color");
    assert_eq!(err.error_code(), "E_INVALID_CELL");
}

#[tokio::test]
async fn list_is_sorted_row_major() {
    let state = AppState::new();
    write_cell(&state, write(5, 1, "#fff", "u1")).await.expect("write");
    write_cell(&state, write(0, 1, "#fff", "u1")).await.expect("write");
    write_cell(&state, write(9, 0, "#fff", "u1")).await.expect("write");
    let coords: Vec<(i64, i64)> = list_cells(&state).await.iter().map(|c| (c.x, c.y)).collect();
    assert_eq!(coords, vec![(9, 0), (0, 1), (5, 1)]);
}
