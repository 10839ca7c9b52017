//! Cell routes: REST endpoints over the cell service.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::error_response;
use crate::services::cells::{self as service, CellError, WriteCell};
use crate::state::AppState;

/// `GET /api/cells`: every stored cell.
pub async fn list_cells(State(state): State<AppState>) -> Response {
    Json(service::list_cells(&state).await).into_response()
}

/// `POST /api/cells`: one atomic write. `200 {cell}` or `4xx {code, message}`.
pub async fn write_cell(State(state): State<AppState>, Json(body): Json<WriteCell>) -> Response {
    match service::write_cell(&state, body).await {
        Ok(cell) => Json(json!({ "cell": cell })).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "cells: write refused");
            error_response(status_for(&e), &e)
        }
    }
}

fn status_for(err: &CellError) -> StatusCode {
    match err {
        CellError::InvalidCell(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CellError::Unauthenticated => StatusCode::UNAUTHORIZED,
    }
}

#[cfg(test)]
#[path = "cells_test.rs"]
mod cells_test;
