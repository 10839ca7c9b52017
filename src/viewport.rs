//! Viewport transform: screen pixels to grid cells under pan and zoom.
//!
//! DESIGN
//! ======
//! A screen point maps to a cell by
//! `floor(((screen - pan) / zoom) / cell_size)` on each axis. The free
//! functions are the pure math shared by the submitter and any renderer;
//! [`Viewport`] carries the client-local zoom/pan state and keeps zoom inside
//! its [`ZoomLimits`].
//!
//! Grid → screen → grid is exact for every cell with `|x|, |y| <=`
//! [`MAX_GRID_AXIS`]; both directions return [`ViewportError::OutOfRange`]
//! outside that domain. Floating point error can land a cell's own corner a
//! few ULPs short of the boundary, so values within a small slack of an
//! integer snap to it before flooring. The slack scales with the magnitude of
//! the inputs (`SNAP_ULPS` ULPs), so a point that really is a hair below a
//! boundary, closer than that slack, also resolves to the cell past it.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::consts::{DEFAULT_CELL_SIZE_PX, DEFAULT_ZOOM_MAX, DEFAULT_ZOOM_MIN, MAX_GRID_AXIS, SNAP_ULPS};
use crate::grid::Coord;

#[allow(clippy::cast_precision_loss)]
const GRID_BOUND: f64 = MAX_GRID_AXIS as f64;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ViewportError {
    #[error("zoom must be positive and finite, got {0}")]
    InvalidZoom(f64),
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f64),
    #[error("zoom limits must satisfy 0 < min <= max, got [{min}, {max}]")]
    InvalidLimits { min: f64, max: f64 },
    #[error("point does not map to a representable cell")]
    OutOfRange,
}

/// A point in screen space (CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// =============================================================================
// PURE TRANSFORM
// =============================================================================

fn check(zoom: f64, cell_size: f64) -> Result<(), ViewportError> {
    if !(zoom.is_finite() && zoom > 0.0) {
        return Err(ViewportError::InvalidZoom(zoom));
    }
    if !(cell_size.is_finite() && cell_size > 0.0) {
        return Err(ViewportError::InvalidCellSize(cell_size));
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn axis_to_cell(screen: f64, pan: f64, zoom: f64, cell_size: f64) -> Result<i64, ViewportError> {
    let raw = ((screen - pan) / zoom) / cell_size;
    if !raw.is_finite() {
        return Err(ViewportError::OutOfRange);
    }
    let nearest = raw.round();
    let slack = SNAP_ULPS * f64::EPSILON * ((screen.abs() + pan.abs()) / (zoom * cell_size) + raw.abs());
    let cell = if (raw - nearest).abs() <= slack { nearest } else { raw.floor() };
    if cell.abs() > GRID_BOUND {
        return Err(ViewportError::OutOfRange);
    }
    Ok(cell as i64)
}

#[allow(clippy::cast_precision_loss)]
fn cell_to_axis(cell: i64, pan: f64, zoom: f64, cell_size: f64) -> Result<f64, ViewportError> {
    if cell.unsigned_abs() > MAX_GRID_AXIS.unsigned_abs() {
        return Err(ViewportError::OutOfRange);
    }
    Ok((cell as f64 * cell_size) * zoom + pan)
}

/// Map a screen point to the cell under it.
///
/// A point within the snap slack below a cell boundary maps to the cell past
/// it: at zoom 1 and cell size 10, `x = 10.0 - 1e-15` is cell 1, while
/// `x = 9.999` is cell 0.
///
/// # Errors
///
/// Returns [`ViewportError`] for a non-positive zoom or cell size, or when the
/// point maps past [`MAX_GRID_AXIS`] on either axis.
pub fn screen_to_grid(screen: Point, zoom: f64, pan: Point, cell_size: f64) -> Result<Coord, ViewportError> {
    check(zoom, cell_size)?;
    Ok(Coord::new(
        axis_to_cell(screen.x, pan.x, zoom, cell_size)?,
        axis_to_cell(screen.y, pan.y, zoom, cell_size)?,
    ))
}

/// Screen position of a cell's top-left corner.
///
/// # Errors
///
/// Returns [`ViewportError`] for a non-positive zoom or cell size, or
/// [`ViewportError::OutOfRange`] when either axis exceeds [`MAX_GRID_AXIS`].
pub fn grid_to_screen(coord: Coord, zoom: f64, pan: Point, cell_size: f64) -> Result<Point, ViewportError> {
    check(zoom, cell_size)?;
    Ok(Point::new(
        cell_to_axis(coord.x, pan.x, zoom, cell_size)?,
        cell_to_axis(coord.y, pan.y, zoom, cell_size)?,
    ))
}

// =============================================================================
// VIEWPORT STATE
// =============================================================================

/// Closed zoom range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    min: f64,
    max: f64,
}

impl ZoomLimits {
    /// # Errors
    ///
    /// Returns [`ViewportError::InvalidLimits`] unless `0 < min <= max`, both finite.
    pub fn new(min: f64, max: f64) -> Result<Self, ViewportError> {
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(ViewportError::InvalidLimits { min, max });
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[must_use]
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min, self.max)
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min: DEFAULT_ZOOM_MIN, max: DEFAULT_ZOOM_MAX }
    }
}

/// Inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub min: Coord,
    pub max: Coord,
}

impl CellRange {
    #[must_use]
    pub fn contains(&self, coord: Coord) -> bool {
        (self.min.x..=self.max.x).contains(&coord.x) && (self.min.y..=self.max.y).contains(&coord.y)
    }
}

/// Client-local pan/zoom state. Never shared or persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    zoom: f64,
    pan: Point,
    cell_size: f64,
    limits: ZoomLimits,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { zoom: 1.0, pan: Point::default(), cell_size: DEFAULT_CELL_SIZE_PX, limits: ZoomLimits::default() }
    }
}

impl Viewport {
    /// Unpanned viewport at zoom 1.0 (clamped into `limits`).
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError::InvalidCellSize`] for a non-positive cell size.
    pub fn new(cell_size: f64, limits: ZoomLimits) -> Result<Self, ViewportError> {
        check(1.0, cell_size)?;
        Ok(Self { zoom: limits.clamp(1.0), pan: Point::default(), cell_size, limits })
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    #[must_use]
    pub fn pan(&self) -> Point {
        self.pan
    }

    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[must_use]
    pub fn limits(&self) -> ZoomLimits {
        self.limits
    }

    /// Set zoom, clamped into the limits. Returns the zoom actually applied.
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError::InvalidZoom`] for a non-positive or non-finite value.
    pub fn set_zoom(&mut self, zoom: f64) -> Result<f64, ViewportError> {
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(ViewportError::InvalidZoom(zoom));
        }
        self.zoom = self.limits.clamp(zoom);
        Ok(self.zoom)
    }

    /// Multiply zoom by `factor`, keeping the world point under `anchor` fixed
    /// on screen.
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError::InvalidZoom`] for a non-positive or non-finite factor.
    pub fn zoom_about(&mut self, anchor: Point, factor: f64) -> Result<f64, ViewportError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ViewportError::InvalidZoom(factor));
        }
        let world_x = (anchor.x - self.pan.x) / self.zoom;
        let world_y = (anchor.y - self.pan.y) / self.zoom;
        self.zoom = self.limits.clamp(self.zoom * factor);
        self.pan = Point::new(anchor.x - world_x * self.zoom, anchor.y - world_y * self.zoom);
        Ok(self.zoom)
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan.x += dx;
        self.pan.y += dy;
    }

    pub fn set_pan(&mut self, pan: Point) {
        self.pan = pan;
    }

    /// # Errors
    ///
    /// Returns [`ViewportError::OutOfRange`] when the point maps outside the grid.
    pub fn screen_to_grid(&self, screen: Point) -> Result<Coord, ViewportError> {
        screen_to_grid(screen, self.zoom, self.pan, self.cell_size)
    }

    /// # Errors
    ///
    /// Returns [`ViewportError::OutOfRange`] when the cell lies past [`MAX_GRID_AXIS`].
    pub fn grid_to_screen(&self, coord: Coord) -> Result<Point, ViewportError> {
        grid_to_screen(coord, self.zoom, self.pan, self.cell_size)
    }

    /// Cells at least partly inside a `width` x `height` screen rectangle
    /// anchored at the origin.
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError::OutOfRange`] when a corner maps outside the grid.
    pub fn visible_cells(&self, width: f64, height: f64) -> Result<CellRange, ViewportError> {
        let min = self.screen_to_grid(Point::new(0.0, 0.0))?;
        let max = self.screen_to_grid(Point::new(width.max(0.0), height.max(0.0)))?;
        Ok(CellRange { min, max })
    }
}
