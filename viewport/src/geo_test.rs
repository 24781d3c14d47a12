#![allow(clippy::float_cmp)]

use super::*;

// --- GeoPoint ---

#[test]
fn geo_point_new_keeps_fields() {
    let p = GeoPoint::new(-122.4, 37.7);
    assert_eq!(p.longitude, -122.4);
    assert_eq!(p.latitude, 37.7);
}

#[test]
fn geo_point_try_new_accepts_edges() {
    assert!(GeoPoint::try_new(180.0, 90.0).is_ok());
    assert!(GeoPoint::try_new(-180.0, -90.0).is_ok());
}

#[test]
fn geo_point_try_new_rejects_longitude_out_of_range() {
    let err = GeoPoint::try_new(190.0, 0.0).unwrap_err();
    assert_eq!(err, FitError::OutOfRange { longitude: 190.0, latitude: 0.0 });
}

#[test]
fn geo_point_try_new_rejects_latitude_out_of_range() {
    assert!(GeoPoint::try_new(0.0, -91.0).is_err());
}

#[test]
fn geo_point_try_new_rejects_nan() {
    assert!(GeoPoint::try_new(f64::NAN, 0.0).is_err());
}

#[test]
fn geo_point_serializes_as_lon_lat_pair() {
    let json = serde_json::to_string(&GeoPoint::new(-122.0, 37.0)).unwrap();
    assert_eq!(json, "[-122.0,37.0]");
}

#[test]
fn geo_point_deserializes_from_pair() {
    let p: GeoPoint = serde_json::from_str("[2.35, 48.85]").unwrap();
    assert_eq!(p, GeoPoint::new(2.35, 48.85));
}

// --- Waypoint ---

#[test]
fn waypoint_deserializes_with_string_id() {
    let w: Waypoint = serde_json::from_str(r#"{"id":"a1","coordinate":[1.0,2.0]}"#).unwrap();
    assert_eq!(w.id, WaypointId::from("a1"));
    assert_eq!(w.coordinate, GeoPoint::new(1.0, 2.0));
}

#[test]
fn waypoint_identity_is_id_not_coordinate() {
    let a = Waypoint::new("a", GeoPoint::new(0.0, 0.0));
    let b = Waypoint::new("b", GeoPoint::new(0.0, 0.0));
    assert_ne!(a, b);
}

// --- WaypointRole ---

#[test]
fn role_single_waypoint_is_start() {
    assert_eq!(WaypointRole::at(0, 1), WaypointRole::Start);
}

#[test]
fn role_first_middle_last() {
    assert_eq!(WaypointRole::at(0, 3), WaypointRole::Start);
    assert_eq!(WaypointRole::at(1, 3), WaypointRole::Stop);
    assert_eq!(WaypointRole::at(2, 3), WaypointRole::End);
}

// --- BoundingBox ---

#[test]
fn bounding_box_center_is_midpoint_of_edges() {
    let bbox = BoundingBox { south_west: GeoPoint::new(-10.0, 20.0), north_east: GeoPoint::new(30.0, 40.0) };
    assert_eq!(bbox.center(), GeoPoint::new(10.0, 30.0));
}

#[test]
fn bounding_box_lon_span() {
    let bbox = BoundingBox { south_west: GeoPoint::new(-122.0, 37.0), north_east: GeoPoint::new(-120.0, 38.0) };
    assert_eq!(bbox.lon_span(), 2.0);
}

// --- CameraState ---

#[test]
fn camera_state_equality_is_by_value() {
    let a = CameraState::at(GeoPoint::new(1.0, 2.0), 15.0);
    let b = CameraState::at(GeoPoint::new(1.0, 2.0), 15.0);
    assert_eq!(a, b);
    assert_ne!(a, CameraState::at(GeoPoint::new(1.0, 2.0), 14.0));
}

#[test]
fn camera_state_unresolved_has_no_position() {
    let cam = CameraState::unresolved(12.0);
    assert!(cam.position.is_none());
    assert_eq!(cam.zoom, 12.0);
}
