#[cfg(test)]
#[path = "geo_test.rs"]
mod geo_test;

use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// A longitude/latitude pair in degrees.
///
/// Serialized as a `[longitude, latitude]` array, the order the host uses for
/// waypoint and route coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    /// Build a point without range checks.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    /// Build a point, rejecting non-finite values and anything outside
    /// longitude `[-180, 180]` / latitude `[-90, 90]`.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::OutOfRange`] for invalid coordinates.
    pub fn try_new(longitude: f64, latitude: f64) -> Result<Self, FitError> {
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        if lon_ok && lat_ok {
            Ok(Self { longitude, latitude })
        } else {
            Err(FitError::OutOfRange { longitude, latitude })
        }
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from([longitude, latitude]: [f64; 2]) -> Self {
        Self { longitude, latitude }
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(p: GeoPoint) -> Self {
        [p.longitude, p.latitude]
    }
}

/// Opaque waypoint identifier. Identity of a waypoint is its id, not its index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaypointId(pub String);

impl std::fmt::Display for WaypointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WaypointId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A user-ordered stop along a journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: WaypointId,
    pub coordinate: GeoPoint,
}

impl Waypoint {
    #[must_use]
    pub fn new(id: impl Into<WaypointId>, coordinate: GeoPoint) -> Self {
        Self { id: id.into(), coordinate }
    }
}

/// Position of a waypoint within its journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointRole {
    Start,
    Stop,
    End,
}

impl WaypointRole {
    /// Role of the waypoint at `index` in a list of `len` waypoints.
    ///
    /// Index 0 is always the start, so a lone waypoint is a start rather than an end.
    #[must_use]
    pub fn at(index: usize, len: usize) -> Self {
        if index == 0 {
            Self::Start
        } else if index + 1 == len {
            Self::End
        } else {
            Self::Stop
        }
    }
}

/// Minimal axis-aligned lon/lat rectangle containing a set of points.
///
/// Longitudes are compared numerically; a box straddling the antimeridian is
/// not folded and simply spans most of the globe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south_west: GeoPoint,
    pub north_east: GeoPoint,
}

impl BoundingBox {
    /// Geometric center: the per-axis midpoint of the box edges.
    #[must_use]
    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            longitude: (self.south_west.longitude + self.north_east.longitude) / 2.0,
            latitude: (self.south_west.latitude + self.north_east.latitude) / 2.0,
        }
    }

    /// East minus west longitude, in degrees. Never negative for a box built by
    /// [`crate::fit::compute_bounds`].
    #[must_use]
    pub fn lon_span(&self) -> f64 {
        self.north_east.longitude - self.south_west.longitude
    }
}

/// Where the map is looking.
///
/// `position == None` means no fixed target yet; the coordinator resolves it
/// from the device location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub position: Option<GeoPoint>,
    pub zoom: f64,
}

impl CameraState {
    #[must_use]
    pub fn at(position: GeoPoint, zoom: f64) -> Self {
        Self { position: Some(position), zoom }
    }

    /// A camera with no target, waiting for a location fix.
    #[must_use]
    pub fn unresolved(zoom: f64) -> Self {
        Self { position: None, zoom }
    }
}
