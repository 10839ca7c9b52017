//! Grid store: the local replica of authoritative cell state.
//!
//! DESIGN
//! ======
//! Cells are keyed by `(x, y)`, never by any server-side row id, because the
//! visible invariant is per coordinate. A write is accepted only when its
//! revision is strictly newer than the stored one, so any delivery order of
//! the same set of updates converges to the same state and re-delivery is a
//! no-op.
//!
//! The store is a plain data structure with no I/O and no locking; the owner
//! decides how it is shared (see [`crate::state`]).

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::Color;

// =============================================================================
// TYPES
// =============================================================================

/// Rejected input. A call that returns this has no effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid color: {0:?}")]
    InvalidColor(String),
    #[error("color out of range: {0:#x}")]
    ColorOutOfRange(u32),
    #[error("revision 0 is never assigned (cell {x},{y})")]
    ZeroRevision { x: i64, y: i64 },
    #[error("coordinate `{axis}` is not an integer: {value}")]
    InvalidCoordinate { axis: &'static str, value: String },
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("unexpected payload for {0}")]
    UnexpectedPayload(String),
}

/// Integer grid coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i64,
    pub y: i64,
}

impl Coord {
    #[must_use]
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Server-assigned, totally ordered write marker. Zero is never assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(pub u64);

/// One authoritative cell record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub x: i64,
    pub y: i64,
    pub color: Color,
    pub revision: Revision,
    /// User id of the writer, when the server reports it. Not used for ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Cell {
    #[must_use]
    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }

    /// Check the invariants a typed `Cell` cannot express on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroRevision`] for revision 0.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.revision.0 == 0 {
            return Err(ValidationError::ZeroRevision { x: self.x, y: self.y });
        }
        Ok(())
    }

    /// Parse a cell from an untyped JSON record (HTTP bulk read / write reply).
    ///
    /// # Errors
    ///
    /// Rejects missing fields, non-integer coordinates, bad colors, and revision 0.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let x = integer_field(value, "x")?;
        let y = integer_field(value, "y")?;
        let color = value
            .get("color")
            .and_then(Value::as_str)
            .ok_or(ValidationError::MissingField("color"))?
            .parse::<Color>()?;
        let revision = value
            .get("revision")
            .and_then(Value::as_u64)
            .ok_or(ValidationError::MissingField("revision"))?;
        let author = value.get("author").and_then(Value::as_str).map(str::to_owned);

        let cell = Self { x, y, color, revision: Revision(revision), author };
        cell.validate()?;
        Ok(cell)
    }
}

impl TryFrom<frames::CellPayload> for Cell {
    type Error = ValidationError;

    fn try_from(payload: frames::CellPayload) -> Result<Self, Self::Error> {
        let cell = Self {
            x: payload.x,
            y: payload.y,
            color: payload.color.parse()?,
            revision: Revision(payload.revision),
            author: payload.author,
        };
        cell.validate()?;
        Ok(cell)
    }
}

impl From<&Cell> for frames::CellPayload {
    fn from(cell: &Cell) -> Self {
        Self {
            x: cell.x,
            y: cell.y,
            color: cell.color.to_string(),
            revision: cell.revision.0,
            author: cell.author.clone(),
        }
    }
}

fn integer_field(value: &Value, key: &'static str) -> Result<i64, ValidationError> {
    let raw = value.get(key).ok_or(ValidationError::MissingField(key))?;
    raw.as_i64()
        .ok_or_else(|| ValidationError::InvalidCoordinate { axis: key, value: raw.to_string() })
}

/// What an [`GridStore::upsert`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// First record for this coordinate.
    Inserted,
    /// Replaced an older revision.
    Replaced,
    /// Incoming revision was not newer; nothing changed.
    Stale,
}

impl Upsert {
    #[must_use]
    pub fn changed(self) -> bool {
        !matches!(self, Self::Stale)
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Sparse map of known cells. Absent coordinates show the background color.
#[derive(Debug, Clone, Default)]
pub struct GridStore {
    cells: HashMap<Coord, Cell>,
    background: Color,
}

impl GridStore {
    #[must_use]
    pub fn new(background: Color) -> Self {
        Self { cells: HashMap::new(), background }
    }

    /// Insert or replace the record at the cell's coordinate when its revision
    /// is newer than the stored one.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for malformed cells; the store is untouched.
    pub fn upsert(&mut self, cell: Cell) -> Result<Upsert, ValidationError> {
        cell.validate()?;
        let coord = cell.coord();
        match self.cells.get_mut(&coord) {
            None => {
                self.cells.insert(coord, cell);
                Ok(Upsert::Inserted)
            }
            Some(existing) if cell.revision > existing.revision => {
                *existing = cell;
                Ok(Upsert::Replaced)
            }
            Some(_) => Ok(Upsert::Stale),
        }
    }

    /// Current color at `(x, y)`, or the background color when unknown.
    #[must_use]
    pub fn get(&self, x: i64, y: i64) -> Color {
        self.cells
            .get(&Coord::new(x, y))
            .map_or(self.background, |cell| cell.color)
    }

    #[must_use]
    pub fn cell(&self, x: i64, y: i64) -> Option<&Cell> {
        self.cells.get(&Coord::new(x, y))
    }

    #[must_use]
    pub fn revision_at(&self, x: i64, y: i64) -> Option<Revision> {
        self.cell(x, y).map(|cell| cell.revision)
    }

    /// Full sparse mapping for an initial render.
    #[must_use]
    pub fn snapshot_all(&self) -> HashMap<Coord, Color> {
        self.cells
            .iter()
            .map(|(coord, cell)| (*coord, cell.color))
            .collect()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    #[must_use]
    pub fn background(&self) -> Color {
        self.background
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Swap in a freshly built store, keeping this store's background.
    pub fn replace_with(&mut self, other: GridStore) {
        self.cells = other.cells;
    }
}
