#![allow(clippy::float_cmp)]

use super::*;
use crate::coordinator::InitialCamera;
use crate::provider::{Platform, ProviderCredentials, ProviderInit, ProviderRegistry};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use viewport::consts::DEFAULT_ZOOM;
use viewport::markers::{MarkerSpec, PolylineSpec};

const HOME: GeoPoint = GeoPoint::new(-122.4, 37.7);

// =========================================================================
// Fake surface
// =========================================================================

#[derive(Default)]
struct SurfaceLog {
    cameras: Vec<(SurfaceId, GeoPoint, f64)>,
    overlays: Vec<(SurfaceId, usize, bool)>,
}

struct FakeSurface {
    id: SurfaceId,
    log: Arc<Mutex<SurfaceLog>>,
}

impl RenderSurface for FakeSurface {
    fn set_camera(&mut self, position: GeoPoint, zoom: f64) {
        self.log.lock().unwrap().cameras.push((self.id, position, zoom));
    }

    fn draw_overlays(&mut self, markers: &[MarkerSpec], route: Option<&PolylineSpec>) {
        self.log.lock().unwrap().overlays.push((self.id, markers.len(), route.is_some()));
    }
}

struct FakeFactory {
    log: Arc<Mutex<SurfaceLog>>,
    created: mpsc::UnboundedSender<(SurfaceId, Provider, SurfaceEvents)>,
}

impl SurfaceFactory for FakeFactory {
    fn create(
        &self,
        id: SurfaceId,
        provider: Provider,
        _init: &ProviderInit,
        events: SurfaceEvents,
    ) -> Box<dyn RenderSurface> {
        self.created.send((id, provider, events)).unwrap();
        Box::new(FakeSurface { id, log: Arc::clone(&self.log) })
    }
}

// =========================================================================
// Gated location service
// =========================================================================

/// Resolves only when the test sends through the gate.
struct GatedLocation {
    gate: Mutex<Option<oneshot::Receiver<Result<GeoPoint, LocationError>>>>,
    requested: mpsc::UnboundedSender<()>,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl LocationService for GatedLocation {
    async fn current_location(&self) -> Result<GeoPoint, LocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.send(()).unwrap();
        let gate = self.gate.lock().unwrap().take();
        match gate {
            Some(rx) => rx.await.unwrap_or_else(|_| Err(LocationError::Unavailable("gate dropped".into()))),
            None => Err(LocationError::Unavailable("gate already used".into())),
        }
    }
}

fn gated_location() -> (
    Arc<GatedLocation>,
    oneshot::Sender<Result<GeoPoint, LocationError>>,
    mpsc::UnboundedReceiver<()>,
) {
    let (gate_tx, gate_rx) = oneshot::channel();
    let (requested_tx, requested_rx) = mpsc::unbounded_channel();
    let location =
        GatedLocation { gate: Mutex::new(Some(gate_rx)), requested: requested_tx, calls: AtomicUsize::new(0) };
    (Arc::new(location), gate_tx, requested_rx)
}

// =========================================================================
// Harness
// =========================================================================

struct Harness {
    handle: SessionHandle,
    created: mpsc::UnboundedReceiver<(SurfaceId, Provider, SurfaceEvents)>,
    reports: mpsc::UnboundedReceiver<SessionReport>,
    log: Arc<Mutex<SurfaceLog>>,
    join: JoinHandle<SessionSummary>,
}

impl Harness {
    fn start(cached: Option<GeoPoint>, location: Arc<dyn LocationService>) -> Self {
        let registry = ProviderRegistry::new(Platform::Android, ProviderCredentials::default());
        let coordinator =
            CameraCoordinator::new(registry, Provider::GoogleMaps, DEFAULT_ZOOM, cached, InitialCamera::default());
        let log = Arc::new(Mutex::new(SurfaceLog::default()));
        let (created_tx, created) = mpsc::unbounded_channel();
        let factory = FakeFactory { log: Arc::clone(&log), created: created_tx };
        let (reports_tx, reports) = mpsc::unbounded_channel();

        let (session, handle) = Session::new(coordinator, Arc::new(factory), location, DEFAULT_QUEUE_CAPACITY);
        let join = tokio::spawn(session.with_reports(reports_tx).run());
        Self { handle, created, reports, log, join }
    }

    async fn next_surface(&mut self) -> (SurfaceId, Provider, SurfaceEvents) {
        self.created.recv().await.unwrap()
    }

    /// Drop the handle, wait for the loop to drain, and return the summary
    /// with every report that was sent.
    async fn finish(self) -> (SessionSummary, Vec<SessionReport>, Arc<Mutex<SurfaceLog>>) {
        let Self { handle, mut reports, log, join, .. } = self;
        drop(handle);
        let summary = join.await.unwrap();
        let mut collected = Vec::new();
        while let Ok(report) = reports.try_recv() {
            collected.push(report);
        }
        (summary, collected, log)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn bootstrap_builds_default_surface() {
    let (location, _gate, _requested) = gated_location();
    let mut h = Harness::start(Some(HOME), location);
    let (id, provider, events) = h.next_surface().await;
    assert_eq!(id, SurfaceId(0));
    assert_eq!(provider, Provider::GoogleMaps);
    assert_eq!(events.id(), SurfaceId(0));

    drop(events);
    let (summary, _, log) = h.finish().await;
    assert_eq!(summary.surfaces_created, 1);
    assert!(log.lock().unwrap().cameras.is_empty());
}

#[tokio::test]
async fn provider_switch_reapplies_camera_to_new_surface() {
    let (location, _gate, _requested) = gated_location();
    let mut h = Harness::start(Some(HOME), location.clone());

    let (_, _, first) = h.next_surface().await;
    first.loaded("GoogleMaps").await.unwrap();

    h.handle.select_provider(Provider::OpenStreetMap).await.unwrap();
    let (id, provider, second) = h.next_surface().await;
    assert_eq!((id, provider), (SurfaceId(1), Provider::OpenStreetMap));
    second.loaded("OpenStreetMap").await.unwrap();

    drop((first, second));
    let (summary, reports, log) = h.finish().await;

    assert_eq!(
        log.lock().unwrap().cameras,
        vec![(SurfaceId(0), HOME, DEFAULT_ZOOM), (SurfaceId(1), HOME, DEFAULT_ZOOM)]
    );
    assert_eq!(summary, SessionSummary { signals: 3, cameras_applied: 2, surfaces_created: 2 });
    assert_eq!(
        reports,
        vec![
            SessionReport::MapReady { surface: SurfaceId(0), provider: Provider::GoogleMaps },
            SessionReport::MapReady { surface: SurfaceId(1), provider: Provider::OpenStreetMap },
        ]
    );
    assert_eq!(location.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn retired_surface_width_cannot_reframe_new_surface() {
    let (location, _gate, _requested) = gated_location();
    let mut h = Harness::start(Some(HOME), location);

    let (_, _, first) = h.next_surface().await;
    first.layout_width(300.0).await.unwrap();
    first.loaded("GoogleMaps").await.unwrap();
    let waypoints = vec![
        Waypoint::new("a", GeoPoint::new(-122.0, 37.0)),
        Waypoint::new("b", GeoPoint::new(-120.0, 38.0)),
    ];
    h.handle.set_waypoints(waypoints, None).await.unwrap();

    h.handle.select_provider(Provider::OpenStreetMap).await.unwrap();
    let (_, _, second) = h.next_surface().await;
    first.layout_width(1200.0).await.unwrap();
    second.loaded("OpenStreetMap").await.unwrap();

    drop((first, second));
    let (_, _, log) = h.finish().await;
    let framed = GeoPoint::new(-121.0, 37.5);
    assert_eq!(
        log.lock().unwrap().cameras,
        vec![(SurfaceId(0), HOME, DEFAULT_ZOOM), (SurfaceId(0), framed, 8.0), (SurfaceId(1), framed, 8.0)]
    );
}

#[tokio::test]
async fn late_location_fix_is_discarded_after_waypoint_framing() {
    let (location, gate, mut requested) = gated_location();
    let mut h = Harness::start(None, location.clone());

    let (_, _, surface) = h.next_surface().await;
    surface.layout_width(300.0).await.unwrap();
    surface.loaded("GoogleMaps").await.unwrap();
    requested.recv().await.unwrap();

    let waypoints = vec![
        Waypoint::new("a", GeoPoint::new(-122.0, 37.0)),
        Waypoint::new("b", GeoPoint::new(-120.0, 38.0)),
    ];
    h.handle.set_waypoints(waypoints, None).await.unwrap();
    gate.send(Ok(GeoPoint::new(10.0, 10.0))).unwrap();

    drop(surface);
    let (summary, _, log) = h.finish().await;

    let log = log.lock().unwrap();
    assert_eq!(log.cameras, vec![(SurfaceId(0), GeoPoint::new(-121.0, 37.5), 8.0)]);
    assert_eq!(log.overlays.last(), Some(&(SurfaceId(0), 2, false)));
    // layout, loaded, waypoints, location result
    assert_eq!(summary.signals, 4);
    assert_eq!(location.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn live_fix_positions_unresolved_camera() {
    let (location, gate, mut requested) = gated_location();
    let mut h = Harness::start(None, location);

    let (_, _, surface) = h.next_surface().await;
    surface.loaded("GoogleMaps").await.unwrap();
    requested.recv().await.unwrap();
    gate.send(Ok(HOME)).unwrap();

    drop(surface);
    let (_, _, log) = h.finish().await;
    assert_eq!(log.lock().unwrap().cameras, vec![(SurfaceId(0), HOME, DEFAULT_ZOOM)]);
}

#[tokio::test]
async fn failed_fix_is_reported_without_moving_camera() {
    let (location, gate, mut requested) = gated_location();
    let mut h = Harness::start(None, location.clone());

    let (_, _, surface) = h.next_surface().await;
    surface.loaded("GoogleMaps").await.unwrap();
    requested.recv().await.unwrap();
    gate.send(Err(LocationError::Unavailable("denied".into()))).unwrap();

    drop(surface);
    let (_, reports, log) = h.finish().await;
    assert!(log.lock().unwrap().cameras.is_empty());
    assert!(reports.contains(&SessionReport::LocationFailed(LocationError::Unavailable("denied".into()))));
    // No retry.
    assert_eq!(location.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn handle_fails_once_session_is_gone() {
    let (location, _gate, _requested) = gated_location();
    let registry = ProviderRegistry::new(Platform::Ios, ProviderCredentials::default());
    let coordinator =
        CameraCoordinator::new(registry, Provider::AppleMaps, DEFAULT_ZOOM, None, InitialCamera::default());
    let log = Arc::new(Mutex::new(SurfaceLog::default()));
    let (created_tx, _created) = mpsc::unbounded_channel();
    let factory = FakeFactory { log, created: created_tx };

    let (session, handle) = Session::new(coordinator, Arc::new(factory), location, 1);
    drop(session);
    assert!(matches!(handle.focus().await, Err(SessionError::Closed)));
}

#[tokio::test]
async fn surface_events_fail_after_session_ends() {
    let (location, _gate, _requested) = gated_location();
    let mut h = Harness::start(Some(HOME), location);
    let (_, _, surface) = h.next_surface().await;
    h.finish().await;

    let err = surface.loaded("GoogleMaps").await.unwrap_err();
    assert!(matches!(err, SessionError::Closed));
    assert_eq!(err.error_code(), "E_SESSION_CLOSED");
}
