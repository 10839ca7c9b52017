//! Shared numeric constants for the pixelboard engine.

// ── Geometry ────────────────────────────────────────────────────

/// Edge length of one grid cell in CSS pixels at zoom 1.0.
pub const DEFAULT_CELL_SIZE_PX: f64 = 10.0;

/// Smallest zoom factor the viewport accepts.
pub const DEFAULT_ZOOM_MIN: f64 = 0.1;

/// Largest zoom factor the viewport accepts.
pub const DEFAULT_ZOOM_MAX: f64 = 40.0;

/// Multiple of `f64::EPSILON` tolerated when snapping a screen point that
/// lands on a cell boundary.
pub const SNAP_ULPS: f64 = 8.0;

/// Largest `|x|` or `|y|` the viewport maps to or from screen space (2^40).
/// Past it `f64` screen positions can no longer tell neighbouring cells apart
/// once pan and zoom are applied.
pub const MAX_GRID_AXIS: i64 = 1 << 40;

// ── Feed ────────────────────────────────────────────────────────

/// First reconnect delay after the feed drops.
pub const RECONNECT_MIN_MS: u64 = 1_000;

/// Upper bound for the doubling reconnect delay.
pub const RECONNECT_MAX_MS: u64 = 10_000;

/// Interval between presence heartbeats while signed in.
pub const HEARTBEAT_SECS: u64 = 15;

// ── RPC ─────────────────────────────────────────────────────────

/// Default HTTP request timeout for bulk reads and writes.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Base URL used when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
