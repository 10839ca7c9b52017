//! HTTP persistence/RPC client.
//!
//! `GET  {base}/api/cells` returns every cell as a JSON array.
//! `POST {base}/api/cells` performs one atomic write and returns `{ "cell": .. }`,
//! `409` when a concurrent write won, or `{ "code", "message" }` on refusal.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{CellBackend, TransportError, WriteError, WriteRequest};
use crate::grid::Cell;

pub struct HttpCellBackend {
    http: reqwest::Client,
    cells_url: String,
}

/// Body of `POST /api/cells`. Writes are tagged with the user id only; the
/// relay keeps no per-cell email.
#[derive(Serialize)]
struct WriteBody<'a> {
    x: i64,
    y: i64,
    color: String,
    user_id: &'a str,
}

impl<'a> WriteBody<'a> {
    fn from_request(request: &'a WriteRequest) -> Self {
        Self { x: request.x, y: request.y, color: request.color.to_string(), user_id: &request.requester.user_id }
    }
}

#[derive(Deserialize)]
struct WriteReply {
    cell: Value,
}

#[derive(Deserialize)]
struct ErrorReply {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl HttpCellBackend {
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the HTTP client cannot be built.
    pub fn new(cells_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(Self { http, cells_url: cells_url.into() })
    }
}

#[async_trait::async_trait]
impl CellBackend for HttpCellBackend {
    async fn fetch_all(&self) -> Result<Vec<Cell>, TransportError> {
        let response = self.http.get(&self.cells_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http(format!("GET {} returned {status}", self.cells_url)));
        }
        let records: Vec<Value> = response.json().await?;
        Ok(parse_cells(&records))
    }

    async fn write_cell(&self, request: WriteRequest) -> Result<Cell, WriteError> {
        let body = WriteBody::from_request(&request);
        let response = self.http.post(&self.cells_url).json(&body).send().await.map_err(TransportError::from)?;
        let status = response.status();
        let text = response.text().await.map_err(TransportError::from)?;
        debug!(%status, x = request.x, y = request.y, "http: write reply");
        parse_write_reply(status, &text)
    }
}

/// Parse a bulk-read body, skipping records that fail validation.
pub(crate) fn parse_cells(records: &[Value]) -> Vec<Cell> {
    records
        .iter()
        .filter_map(|record| match Cell::from_json(record) {
            Ok(cell) => Some(cell),
            Err(e) => {
                warn!(error = %e, %record, "http: skipping invalid cell");
                None
            }
        })
        .collect()
}

pub(crate) fn parse_write_reply(status: StatusCode, text: &str) -> Result<Cell, WriteError> {
    if status.is_success() {
        let reply: WriteReply =
            serde_json::from_str(text).map_err(|e| TransportError::Decode(e.to_string()))?;
        return Cell::from_json(&reply.cell).map_err(|e| TransportError::Decode(e.to_string()).into());
    }
    if status == StatusCode::CONFLICT {
        return Err(WriteError::Conflict);
    }
    if status.is_server_error() {
        return Err(TransportError::Http(format!("server returned {status}")).into());
    }
    let (code, message) = match serde_json::from_str::<ErrorReply>(text) {
        Ok(reply) if !reply.code.is_empty() => (reply.code, reply.message),
        _ => (format!("HTTP_{}", status.as_u16()), text.to_owned()),
    };
    Err(WriteError::Rejected { code, message })
}

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;
