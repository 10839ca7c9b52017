//! Cell service: bulk read and atomic single-cell writes.
//!
//! DESIGN
//! ======
//! Each coordinate carries its own revision counter. A write takes the
//! cells write lock, assigns `previous + 1` (first write is 1), stores the
//! cell and queues the `cell:changed` broadcast before releasing the lock,
//! so broadcasts for one coordinate leave in revision order.

use frames::{CellPayload, Frame, Payload, syscall, topic};
use pixelboard::Color;
use serde::Deserialize;
use tracing::info;

use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CellError {
    #[error("invalid cell: {0}")]
    InvalidCell(String),
    #[error("a signed-in user is required to paint")]
    Unauthenticated,
}

impl crate::error::ErrorCode for CellError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCell(_) => "E_INVALID_CELL",
            Self::Unauthenticated => "E_UNAUTHENTICATED",
        }
    }
}

/// Body of `POST /api/cells`.
#[derive(Debug, Clone, Deserialize)]
pub struct WriteCell {
    pub x: i64,
    pub y: i64,
    pub color: String,
    #[serde(default)]
    pub user_id: String,
}

// =============================================================================
// READ
// =============================================================================

/// Every stored cell, ordered by `(y, x)` for stable output.
pub async fn list_cells(state: &AppState) -> Vec<CellPayload> {
    let cells = state.cells.read().await;
    let mut list: Vec<CellPayload> = cells.values().cloned().collect();
    list.sort_by_key(|cell| (cell.y, cell.x));
    list
}

// =============================================================================
// WRITE
// =============================================================================

/// Store one cell under a fresh revision and broadcast the change.
///
/// # Errors
///
/// Returns `Unauthenticated` when no user is named and `InvalidCell` when
/// the color does not parse.
pub async fn write_cell(state: &AppState, write: WriteCell) -> Result<CellPayload, CellError> {
    if write.user_id.trim().is_empty() {
        return Err(CellError::Unauthenticated);
    }
    let color: Color = write.color.parse().map_err(|e| CellError::InvalidCell(format!("{e}")))?;

    let mut cells = state.cells.write().await;
    let previous = cells.get(&(write.x, write.y)).map_or(0, |cell| cell.revision);
    let cell = CellPayload {
        x: write.x,
        y: write.y,
        color: color.to_string(),
        revision: previous + 1,
        author: Some(write.user_id),
    };
    cells.insert((cell.x, cell.y), cell.clone());

    let frame = Frame::request(syscall::CELL_CHANGED, Payload::Cell(cell.clone())).with_topic(topic::CELLS);
    state.broadcast(&frame, None).await;
    drop(cells);

    info!(x = cell.x, y = cell.y, color = %cell.color, revision = cell.revision, "cells: write");
    Ok(cell)
}

#[cfg(test)]
#[path = "cells_test.rs"]
mod cells_test;
