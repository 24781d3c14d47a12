//! Shared numeric constants for the viewport crate.

// ── Web Mercator ────────────────────────────────────────────────

/// Width in pixels of one map tile at zoom 0.
pub const MERCATOR_TILE_PX: f64 = 256.0;

/// Degrees of longitude in a full turn around the globe.
pub const FULL_TURN_DEG: f64 = 360.0;

// ── Camera ──────────────────────────────────────────────────────

/// Zoom used for a single framed point, and when no zoom is otherwise known.
pub const DEFAULT_ZOOM: f64 = 15.0;

// ── Presentation ────────────────────────────────────────────────

/// Route polyline and start marker color.
pub const GREEN_HEX: &str = "#03D47C";

/// End marker color.
pub const BLUE_HEX: &str = "#5AB0FF";

/// Route polyline stroke width in pixels.
pub const ROUTE_WIDTH_PX: f64 = 20.0;
