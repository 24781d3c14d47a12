//! Viewport fitting: bounds, zoom-to-fit and the framing camera.
//!
//! All functions are pure. The coordinator calls [`compute_framing_camera`]
//! whenever the waypoint set, the route or the viewport width changes.

#[cfg(test)]
#[path = "fit_test.rs"]
mod fit_test;

use crate::consts::{FULL_TURN_DEG, MERCATOR_TILE_PX};
use crate::error::FitError;
use crate::geo::{BoundingBox, CameraState, GeoPoint, Waypoint};

/// Smallest box containing every point.
///
/// Order-independent. No antimeridian correction is applied.
///
/// # Errors
///
/// Returns [`FitError::EmptyPointSet`] when `points` is empty.
pub fn compute_bounds(points: &[GeoPoint]) -> Result<BoundingBox, FitError> {
    let (first, rest) = points.split_first().ok_or(FitError::EmptyPointSet)?;

    let mut south_west = *first;
    let mut north_east = *first;
    for p in rest {
        south_west.longitude = south_west.longitude.min(p.longitude);
        south_west.latitude = south_west.latitude.min(p.latitude);
        north_east.longitude = north_east.longitude.max(p.longitude);
        north_east.latitude = north_east.latitude.max(p.latitude);
    }

    Ok(BoundingBox { south_west, north_east })
}

/// Zoom level at which the east-west span fits `viewport_px_width`.
///
/// A negative span (east and west passed across the antimeridian) is corrected
/// by adding a full turn. The result is rounded but not clamped to any
/// provider's supported range.
///
/// # Errors
///
/// - [`FitError::DegenerateSpan`] when east equals west.
/// - [`FitError::InvalidViewportWidth`] when the width is not a positive finite number.
pub fn compute_zoom_to_fit(east_lon: f64, west_lon: f64, viewport_px_width: f64) -> Result<i32, FitError> {
    if !viewport_px_width.is_finite() || viewport_px_width <= 0.0 {
        return Err(FitError::InvalidViewportWidth(viewport_px_width));
    }

    let mut span = east_lon - west_lon;
    if span < 0.0 {
        span += FULL_TURN_DEG;
    }
    if span == 0.0 {
        return Err(FitError::DegenerateSpan);
    }

    let tiles = viewport_px_width * FULL_TURN_DEG / span / MERCATOR_TILE_PX;
    #[allow(clippy::cast_possible_truncation)]
    let zoom = tiles.log2().round() as i32;
    Ok(zoom)
}

/// Camera that frames the waypoints and, if present, the route.
///
/// - One waypoint and no route points: centered on it at `default_zoom`.
/// - Otherwise: centered on the bounding box with the zoom that fits its
///   longitude span. When every point shares one meridian the span is zero
///   and `default_zoom` is used instead.
///
/// # Errors
///
/// - [`FitError::EmptyPointSet`] when `waypoints` is empty; callers keep their
///   prior camera in that case.
/// - [`FitError::InvalidViewportWidth`] for an unusable width.
pub fn compute_framing_camera(
    waypoints: &[Waypoint],
    route: Option<&[GeoPoint]>,
    viewport_px_width: f64,
    default_zoom: f64,
) -> Result<CameraState, FitError> {
    let route = route.unwrap_or_default();
    match waypoints {
        [] => Err(FitError::EmptyPointSet),
        [only] if route.is_empty() => Ok(CameraState::at(only.coordinate, default_zoom)),
        _ => {
            let points: Vec<GeoPoint> = waypoints
                .iter()
                .map(|w| w.coordinate)
                .chain(route.iter().copied())
                .collect();
            let bounds = compute_bounds(&points)?;
            let zoom = match compute_zoom_to_fit(
                bounds.north_east.longitude,
                bounds.south_west.longitude,
                viewport_px_width,
            ) {
                Ok(z) => f64::from(z),
                Err(FitError::DegenerateSpan) => default_zoom,
                Err(e) => return Err(e),
            };
            Ok(CameraState::at(bounds.center(), zoom))
        }
    }
}
