use super::*;
use crate::coordinator::{CameraCoordinator, InitialCamera};
use crate::location::FixedLocation;
use crate::provider::{Platform, ProviderCredentials, ProviderRegistry};
use crate::session::{Session, SessionSummary};
use serde_json::json;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::task::JoinHandle;
use viewport::ErrorCode;
use viewport::consts::DEFAULT_ZOOM;

struct Host {
    handle: SessionHandle,
    tracker: SurfaceTracker,
    commands: mpsc::UnboundedReceiver<SurfaceCommand>,
    join: JoinHandle<SessionSummary>,
}

fn start() -> Host {
    let registry = ProviderRegistry::new(Platform::Android, ProviderCredentials::default());
    let coordinator = CameraCoordinator::new(registry, Provider::GoogleMaps, DEFAULT_ZOOM, None, InitialCamera::default());
    let (commands_tx, commands) = mpsc::unbounded_channel();
    let (factory, tracker) = TraceSurfaceFactory::new(commands_tx);
    let (session, handle) = Session::new(coordinator, Arc::new(factory), Arc::new(FixedLocation(None)), 16);
    let join = tokio::spawn(session.run());
    Host { handle, tracker, commands, join }
}

async fn run_script(script: &str) -> (usize, Vec<SurfaceCommand>) {
    let mut host = start();
    let replayed = replay(BufReader::new(script.as_bytes()), &host.handle, &mut host.tracker, DEFAULT_SURFACE_WAIT)
        .await
        .unwrap();
    drop(host.handle);
    host.join.await.unwrap();

    let mut commands = Vec::new();
    while let Ok(command) = host.commands.try_recv() {
        commands.push(command);
    }
    (replayed, commands)
}

fn cameras(commands: &[SurfaceCommand]) -> Vec<&SurfaceCommand> {
    commands.iter().filter(|c| matches!(c, SurfaceCommand::SetCamera { .. })).collect()
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn parse_skips_blank_and_comment_lines() {
    assert_eq!(parse_event("   ", 1).unwrap(), None);
    assert_eq!(parse_event("# setup", 2).unwrap(), None);
}

#[test]
fn parse_reads_each_event_type() {
    assert_eq!(parse_event(r#"{"type":"focus"}"#, 1).unwrap(), Some(HostEvent::Focus));
    assert_eq!(
        parse_event(r#"{"type":"layout","width":320}"#, 1).unwrap(),
        Some(HostEvent::Layout { surface: None, width: 320.0 })
    );
    assert_eq!(
        parse_event(r#"{"type":"loaded","provider":"Mapbox","surface":2}"#, 1).unwrap(),
        Some(HostEvent::Loaded { surface: Some(2), provider: "Mapbox".into() })
    );
    assert_eq!(
        parse_event(r#"{"type":"select_provider","provider":"GoogleMapsIOS"}"#, 1).unwrap(),
        Some(HostEvent::SelectProvider { provider: Provider::GoogleMapsIos })
    );
    assert_eq!(
        parse_event(r#"{"type":"cached_location","location":[-122.4,37.7]}"#, 1).unwrap(),
        Some(HostEvent::CachedLocation { location: GeoPoint::new(-122.4, 37.7) })
    );

    let Some(HostEvent::Waypoints { waypoints, route }) =
        parse_event(r#"{"type":"waypoints","waypoints":[{"id":"a","coordinate":[1.5,2.5]}]}"#, 1).unwrap()
    else {
        panic!("expected waypoints");
    };
    assert_eq!(waypoints, vec![Waypoint::new("a", GeoPoint::new(1.5, 2.5))]);
    assert_eq!(route, None);
}

#[test]
fn parse_error_carries_line_number() {
    let err = parse_event(r#"{"type":"teleport"}"#, 7).unwrap_err();
    assert!(matches!(err, SessionError::InvalidEvent { line: 7, .. }));
}

#[test]
fn surface_command_serializes_as_tagged_json() {
    let command = SurfaceCommand::SetCamera {
        surface: 1,
        provider: Provider::OpenStreetMap,
        position: GeoPoint::new(-121.0, 37.5),
        zoom: 8.0,
    };
    assert_eq!(
        serde_json::to_value(&command).unwrap(),
        json!({"command": "set_camera", "surface": 1, "provider": "OpenStreetMap", "position": [-121.0, 37.5], "zoom": 8.0})
    );
}

// =============================================================================
// Replay
// =============================================================================

#[tokio::test]
async fn replay_frames_waypoints() {
    let script = r#"
# surface comes up before any waypoints
{"type":"layout","width":300}
{"type":"loaded","provider":"GoogleMaps"}
{"type":"waypoints","waypoints":[{"id":"a","coordinate":[-122,37]},{"id":"b","coordinate":[-120,38]}]}
"#;
    let (replayed, commands) = run_script(script).await;

    assert_eq!(replayed, 3);
    assert_eq!(
        cameras(&commands),
        vec![&SurfaceCommand::SetCamera {
            surface: 0,
            provider: Provider::GoogleMaps,
            position: GeoPoint::new(-121.0, 37.5),
            zoom: 8.0,
        }]
    );
    let Some(SurfaceCommand::DrawOverlays { markers, route, .. }) =
        commands.iter().rev().find(|c| matches!(c, SurfaceCommand::DrawOverlays { .. }))
    else {
        panic!("expected overlays");
    };
    assert_eq!(markers.len(), 2);
    assert!(route.is_none());
}

#[tokio::test]
async fn replay_provider_switch_moves_camera_to_new_surface() {
    let script = r#"
{"type":"cached_location","location":[-122.4,37.7]}
{"type":"loaded","provider":"GoogleMaps","surface":0}
{"type":"select_provider","provider":"OpenStreetMap"}
{"type":"loaded","provider":"OpenStreetMap","surface":1}
"#;
    let (_, commands) = run_script(script).await;

    let home = GeoPoint::new(-122.4, 37.7);
    assert_eq!(
        cameras(&commands),
        vec![
            &SurfaceCommand::SetCamera { surface: 0, provider: Provider::GoogleMaps, position: home, zoom: DEFAULT_ZOOM },
            &SurfaceCommand::SetCamera {
                surface: 1,
                provider: Provider::OpenStreetMap,
                position: home,
                zoom: DEFAULT_ZOOM,
            },
        ]
    );
}

#[tokio::test]
async fn replay_stops_on_bad_line() {
    let mut host = start();
    let script = "{\"type\":\"focus\"}\n\nnot json\n{\"type\":\"focus\"}\n";
    let err = replay(BufReader::new(script.as_bytes()), &host.handle, &mut host.tracker, DEFAULT_SURFACE_WAIT)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::InvalidEvent { line: 3, .. }));
    assert_eq!(err.error_code(), "E_INVALID_EVENT");
}

#[tokio::test]
async fn replay_times_out_on_unknown_surface() {
    let mut host = start();
    let script = r#"{"type":"loaded","provider":"GoogleMaps","surface":7}"#;
    let err = replay(BufReader::new(script.as_bytes()), &host.handle, &mut host.tracker, Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::SurfaceTimeout(SurfaceId(7))));
}

#[tokio::test]
async fn waiting_for_newest_surface_with_none_built_is_not_surface_zero() {
    let (commands_tx, _commands) = mpsc::unbounded_channel();
    let (_factory, mut tracker) = TraceSurfaceFactory::new(commands_tx);

    let Err(err) = tracker.events(None, Duration::from_millis(50)).await else {
        panic!("no surface was built");
    };
    assert!(matches!(err, SessionError::NoSurface));
    assert_eq!(err.to_string(), "timed out waiting for any surface");
    assert_eq!(err.error_code(), "E_SURFACE_TIMEOUT");
}
