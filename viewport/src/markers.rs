//! Presentation descriptors for waypoint markers and the route polyline.
//!
//! The renderer draws these; this module only decides what each marker says
//! and how it is styled from its position in the journey.

#[cfg(test)]
#[path = "markers_test.rs"]
mod markers_test;

use serde::Serialize;

use crate::consts::{BLUE_HEX, GREEN_HEX, ROUTE_WIDTH_PX};
use crate::error::FitError;
use crate::geo::{GeoPoint, Waypoint, WaypointRole};

/// Marker icon choice. Start and end markers use the provider's default pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerIcon {
    Default,
    Stop,
}

/// One waypoint marker as handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSpec {
    /// Stable render key, derived from the waypoint id.
    pub key: String,
    pub position: GeoPoint,
    pub title: String,
    pub snippet: &'static str,
    /// Packed `0xRRGGBB` background, if the role has one.
    pub background_color: Option<u32>,
    pub icon: MarkerIcon,
    pub clickable: bool,
}

/// Line joint style for polylines. Routes are always drawn mitered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JointType {
    Miter,
}

/// Route polyline as handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolylineSpec {
    pub points: Vec<GeoPoint>,
    pub color: u32,
    pub width: f64,
    pub joint_type: JointType,
}

/// Parse a `#RRGGBB` color into a packed integer.
///
/// # Errors
///
/// Returns [`FitError::InvalidColor`] if the string is not six hex digits
/// after an optional `#`.
pub fn color_str_to_int(color: &str) -> Result<u32, FitError> {
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(FitError::InvalidColor(color.to_owned()));
    }
    u32::from_str_radix(hex, 16).map_err(|_| FitError::InvalidColor(color.to_owned()))
}

fn snippet(role: WaypointRole) -> &'static str {
    match role {
        WaypointRole::Start => "Start of journey",
        WaypointRole::End => "End of journey",
        WaypointRole::Stop => "Stop on journey",
    }
}

/// Marker descriptors for every waypoint, in journey order.
///
/// # Errors
///
/// Only fails if one of the built-in palette colors is malformed.
pub fn waypoint_markers(waypoints: &[Waypoint]) -> Result<Vec<MarkerSpec>, FitError> {
    let green = color_str_to_int(GREEN_HEX)?;
    let blue = color_str_to_int(BLUE_HEX)?;
    let len = waypoints.len();

    Ok(waypoints
        .iter()
        .enumerate()
        .map(|(index, waypoint)| {
            let role = WaypointRole::at(index, len);
            let (background_color, icon) = match role {
                WaypointRole::Start => (Some(green), MarkerIcon::Default),
                WaypointRole::End => (Some(blue), MarkerIcon::Default),
                WaypointRole::Stop => (None, MarkerIcon::Stop),
            };
            MarkerSpec {
                key: format!("waypoint-{}", waypoint.id),
                position: waypoint.coordinate,
                title: format!("Waypoint #{}", index + 1),
                snippet: snippet(role),
                background_color,
                icon,
                clickable: true,
            }
        })
        .collect())
}

/// Polyline descriptor for the route.
///
/// # Errors
///
/// Only fails if the built-in route color is malformed.
pub fn route_polyline(route: &[GeoPoint]) -> Result<PolylineSpec, FitError> {
    Ok(PolylineSpec {
        points: route.to_vec(),
        color: color_str_to_int(GREEN_HEX)?,
        width: ROUTE_WIDTH_PX,
        joint_type: JointType::Miter,
    })
}
