//! Viewport geometry for the waypoint map.
//!
//! This crate is pure and synchronous. It owns the value types shared with the
//! camera coordinator (geographic points, waypoints, bounding boxes, camera
//! state) and the fitting math that turns a set of points into a camera that
//! frames them. It never talks to a renderer or a location service; the host
//! crate feeds it data and forwards the resulting [`geo::CameraState`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`geo`] | `GeoPoint`, `Waypoint`, `BoundingBox`, `CameraState` |
//! | [`fit`] | Bounds, zoom-to-fit and framing camera computation |
//! | [`markers`] | Marker and polyline presentation descriptors |
//! | [`error`] | [`error::FitError`] and the [`error::ErrorCode`] trait |
//! | [`consts`] | Shared numeric constants (tile width, default zoom, styling) |

pub mod consts;
pub mod error;
pub mod fit;
pub mod geo;
pub mod markers;

pub use error::{ErrorCode, FitError};
pub use fit::{compute_bounds, compute_framing_camera, compute_zoom_to_fit};
pub use geo::{BoundingBox, CameraState, GeoPoint, Waypoint, WaypointId, WaypointRole};
