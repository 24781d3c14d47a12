//! Camera coordinator: decides where the map looks and when to tell it.
//!
//! DESIGN
//! ======
//! A synchronous state machine. Every input arrives as a [`Signal`]; every
//! side effect leaves as an [`Effect`] for the session to execute. Nothing in
//! here awaits, locks or touches a surface directly, so ordering is exactly
//! the order signals are handled.
//!
//! Three independent inputs compete for the camera: location (cached or live),
//! the waypoint set, and provider switches. Which one produced the current
//! camera is tracked as a [`CameraSource`], and a late result is only allowed
//! to land if the source still says it is the one being waited for.
//!
//! SURFACES
//! ========
//! Each provider switch retires the current surface and mints a new
//! [`SurfaceId`]. Camera commands are addressed to an id, and deduplication is
//! keyed by `(surface, camera)`, so a freshly loaded surface always receives
//! one camera command even when the camera itself has not changed.

use tracing::{debug, info, warn};
use viewport::markers::{self, MarkerSpec, PolylineSpec};
use viewport::{CameraState, GeoPoint, Waypoint, compute_framing_camera};

use crate::location::LocationError;
use crate::provider::{Provider, ProviderInit, ProviderRegistry};
use crate::surface::SurfaceId;

// =============================================================================
// SIGNALS AND EFFECTS
// =============================================================================

/// Identifier of one live location request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationTicket(pub u64);

/// Inputs to the coordinator, processed one at a time.
#[derive(Debug, Clone)]
pub enum Signal {
    /// The waypoint list or route changed. An empty list keeps the prior camera.
    WaypointsChanged { waypoints: Vec<Waypoint>, route: Option<Vec<GeoPoint>> },
    /// A surface reported its display width in pixels.
    LayoutWidth { surface: SurfaceId, px: f64 },
    /// A surface finished loading.
    SurfaceLoaded { surface: SurfaceId, provider_name: String },
    /// The user picked a rendering backend.
    ProviderSelected(Provider),
    /// The cached last-known location became available.
    CachedLocation(GeoPoint),
    /// A live location request finished.
    LocationResolved { ticket: LocationTicket, result: Result<GeoPoint, LocationError> },
    /// The screen hosting the map regained focus.
    Focused,
}

/// Side effects requested by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Tear down the current surface and build `surface` with `provider`.
    InitializeSurface { surface: SurfaceId, provider: Provider, init: ProviderInit },
    /// Move the camera of `surface`.
    SetCamera { surface: SurfaceId, position: GeoPoint, zoom: f64 },
    /// Replace markers and route on `surface`.
    DrawOverlays { surface: SurfaceId, markers: Vec<MarkerSpec>, route: Option<PolylineSpec> },
    /// Ask the location service for a fix.
    RequestLocation { ticket: LocationTicket },
    /// A live location request failed; surface it to the embedding UI.
    LocationFailed(LocationError),
    /// `surface` is ready to use.
    MapReady { surface: SurfaceId, provider: Provider },
}

/// Which cause produced the current camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraSource {
    /// No position yet.
    None,
    /// Position from the caller-provided initial state.
    InitialState,
    /// Position from the last-known location store.
    CachedLocation,
    /// Waiting on the live request with this ticket; position is unknown.
    LiveLocationPending(LocationTicket),
    /// Position from a live location fix.
    LiveLocation,
    /// Position and zoom framed from the waypoints.
    WaypointFramed,
}

/// Caller-provided starting camera.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InitialCamera {
    pub location: Option<GeoPoint>,
    pub zoom: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct SurfaceSlot {
    id: SurfaceId,
    provider: Provider,
    loaded: bool,
}

// =============================================================================
// COORDINATOR
// =============================================================================

pub struct CameraCoordinator {
    registry: ProviderRegistry,
    default_zoom: f64,
    camera: CameraState,
    source: CameraSource,
    surface: SurfaceSlot,
    /// Set while a provider switch is waiting for its surface to load.
    switching: bool,
    last_applied: Option<(SurfaceId, CameraState)>,
    layout_width: Option<f64>,
    waypoints: Vec<Waypoint>,
    route: Option<Vec<GeoPoint>>,
    /// Waypoints, route or width changed since the camera was last framed.
    framing_stale: bool,
    in_flight: Option<LocationTicket>,
    next_ticket: u64,
}

impl CameraCoordinator {
    /// Build a coordinator for a session starting on `provider`.
    ///
    /// The starting position is the cached location, else the initial
    /// state's location, else unknown. Zoom is the initial state's, else
    /// `default_zoom`.
    #[must_use]
    pub fn new(
        registry: ProviderRegistry,
        provider: Provider,
        default_zoom: f64,
        cached: Option<GeoPoint>,
        initial: InitialCamera,
    ) -> Self {
        let (position, source) = match (cached, initial.location) {
            (Some(p), _) => (Some(p), CameraSource::CachedLocation),
            (None, Some(p)) => (Some(p), CameraSource::InitialState),
            (None, None) => (None, CameraSource::None),
        };
        Self {
            registry,
            default_zoom,
            camera: CameraState { position, zoom: initial.zoom.unwrap_or(default_zoom) },
            source,
            surface: SurfaceSlot { id: SurfaceId::default(), provider, loaded: false },
            switching: false,
            last_applied: None,
            layout_width: None,
            waypoints: Vec::new(),
            route: None,
            framing_stale: false,
            in_flight: None,
            next_ticket: 0,
        }
    }

    /// Effects that build the first surface.
    #[must_use]
    pub fn bootstrap(&self) -> Vec<Effect> {
        let provider = self.surface.provider;
        let init = if provider == self.registry.default_provider() {
            self.registry.default_init()
        } else {
            self.registry.init_for(provider)
        };
        vec![Effect::InitializeSurface { surface: self.surface.id, provider, init }]
    }

    /// Process one signal and return the effects it causes, in order.
    pub fn handle(&mut self, signal: Signal) -> Vec<Effect> {
        let mut effects = Vec::new();
        match signal {
            Signal::WaypointsChanged { waypoints, route } => self.on_waypoints(waypoints, route, &mut effects),
            Signal::LayoutWidth { surface, px } => self.on_layout_width(surface, px, &mut effects),
            Signal::SurfaceLoaded { surface, provider_name } => {
                self.on_surface_loaded(surface, &provider_name, &mut effects);
            }
            Signal::ProviderSelected(provider) => self.on_provider_selected(provider, &mut effects),
            Signal::CachedLocation(point) => self.on_cached_location(point, &mut effects),
            Signal::LocationResolved { ticket, result } => self.on_location_resolved(ticket, result, &mut effects),
            Signal::Focused => {
                self.reframe();
                self.ensure_location(&mut effects);
                self.apply(&mut effects);
            }
        }
        effects
    }

    // --- Queries ---

    #[must_use]
    pub fn camera(&self) -> CameraState {
        self.camera
    }

    #[must_use]
    pub fn source(&self) -> CameraSource {
        self.source
    }

    #[must_use]
    pub fn surface(&self) -> SurfaceId {
        self.surface.id
    }

    #[must_use]
    pub fn active_provider(&self) -> Provider {
        self.surface.provider
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.surface.loaded
    }

    /// A provider switch is waiting for its new surface to load.
    #[must_use]
    pub fn switch_pending(&self) -> bool {
        self.switching
    }

    #[must_use]
    pub fn location_in_flight(&self) -> Option<LocationTicket> {
        self.in_flight
    }

    // --- Signal handlers ---

    fn on_waypoints(&mut self, waypoints: Vec<Waypoint>, route: Option<Vec<GeoPoint>>, effects: &mut Vec<Effect>) {
        debug!(count = waypoints.len(), route_points = route.as_ref().map_or(0, Vec::len), "waypoints changed");
        self.waypoints = waypoints;
        self.route = route;
        self.framing_stale = !self.waypoints.is_empty();
        if self.waypoints.is_empty() && self.source == CameraSource::WaypointFramed {
            // The framed camera stays put but no longer outranks location.
            self.source = CameraSource::InitialState;
        }

        self.draw_overlays(effects);
        self.reframe();
        self.ensure_location(effects);
        self.apply(effects);
    }

    fn on_layout_width(&mut self, surface: SurfaceId, px: f64, effects: &mut Vec<Effect>) {
        if surface != self.surface.id {
            debug!(%surface, current = %self.surface.id, "ignoring width of retired surface");
            return;
        }
        if !px.is_finite() || px <= 0.0 {
            warn!(px, "ignoring unusable layout width");
            return;
        }
        if self.layout_width == Some(px) {
            return;
        }
        debug!(px, "layout width changed");
        self.layout_width = Some(px);
        if !self.waypoints.is_empty() {
            self.framing_stale = true;
        }
        self.reframe();
        self.apply(effects);
    }

    fn on_surface_loaded(&mut self, surface: SurfaceId, provider_name: &str, effects: &mut Vec<Effect>) {
        if surface != self.surface.id {
            debug!(%surface, current = %self.surface.id, "ignoring load of retired surface");
            return;
        }
        if self.surface.loaded {
            debug!(%surface, "surface already loaded");
            return;
        }

        let provider = self.registry.find_by_name(provider_name).unwrap_or_else(|| {
            warn!(provider_name, "surface loaded with unknown provider; assuming platform default");
            self.registry.default_provider()
        });
        info!(%surface, %provider, "surface loaded");

        self.surface.loaded = true;
        self.surface.provider = provider;
        self.switching = false;
        effects.push(Effect::MapReady { surface, provider });

        self.draw_overlays(effects);
        self.reframe();
        self.ensure_location(effects);
        self.apply(effects);
    }

    fn on_provider_selected(&mut self, provider: Provider, effects: &mut Vec<Effect>) {
        if !self.registry.is_available(provider) {
            warn!(%provider, platform = ?self.registry.platform(), "provider not available on this platform");
            return;
        }
        if provider == self.surface.provider {
            debug!(%provider, "provider already active");
            return;
        }
        if self.switching {
            info!(from = %self.surface.provider, to = %provider, "superseding pending provider switch");
        }

        let surface = self.surface.id.next();
        info!(%surface, %provider, "switching provider");
        self.surface = SurfaceSlot { id: surface, provider, loaded: false };
        self.switching = true;
        effects.push(Effect::InitializeSurface { surface, provider, init: self.registry.init_for(provider) });
    }

    fn on_cached_location(&mut self, point: GeoPoint, effects: &mut Vec<Effect>) {
        match self.source {
            CameraSource::None | CameraSource::InitialState | CameraSource::CachedLocation => {
                debug!(lon = point.longitude, lat = point.latitude, "adopting cached location");
                self.camera.position = Some(point);
                self.source = CameraSource::CachedLocation;
                self.apply(effects);
            }
            other => debug!(source = ?other, "ignoring cached location; a fresher cause owns the camera"),
        }
    }

    fn on_location_resolved(
        &mut self,
        ticket: LocationTicket,
        result: Result<GeoPoint, LocationError>,
        effects: &mut Vec<Effect>,
    ) {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }
        let awaited = self.source == CameraSource::LiveLocationPending(ticket);

        match result {
            Ok(point) if awaited => {
                debug!(ticket = ticket.0, lon = point.longitude, lat = point.latitude, "adopting live location");
                self.camera.position = Some(point);
                self.source = CameraSource::LiveLocation;
                self.apply(effects);
            }
            Ok(_) => debug!(ticket = ticket.0, source = ?self.source, "discarding superseded location fix"),
            Err(e) => {
                warn!(ticket = ticket.0, error = %e, "live location request failed");
                if awaited {
                    self.source = CameraSource::None;
                }
                effects.push(Effect::LocationFailed(e));
            }
        }
    }

    // --- Steps ---

    /// Recompute the camera from the waypoints if they, the route or the
    /// width changed, the surface is loaded and the width is known.
    fn reframe(&mut self) {
        if !self.framing_stale || !self.surface.loaded {
            return;
        }
        let Some(width) = self.layout_width else {
            return;
        };
        match compute_framing_camera(&self.waypoints, self.route.as_deref(), width, self.default_zoom) {
            Ok(camera) => {
                debug!(zoom = camera.zoom, "framed waypoints");
                self.camera = camera;
                self.source = CameraSource::WaypointFramed;
                self.framing_stale = false;
            }
            Err(e) => warn!(error = %e, "framing failed; keeping prior camera"),
        }
    }

    /// Request a live fix if nothing has given the camera a position yet.
    fn ensure_location(&mut self, effects: &mut Vec<Effect>) {
        if self.camera.position.is_some() || !self.surface.loaded || self.in_flight.is_some() {
            return;
        }
        let ticket = LocationTicket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        self.source = CameraSource::LiveLocationPending(ticket);
        debug!(ticket = ticket.0, "requesting live location");
        effects.push(Effect::RequestLocation { ticket });
    }

    fn draw_overlays(&self, effects: &mut Vec<Effect>) {
        if !self.surface.loaded {
            return;
        }
        let overlays = markers::waypoint_markers(&self.waypoints).and_then(|pins| {
            let route = self.route.as_deref().map(markers::route_polyline).transpose()?;
            Ok((pins, route))
        });
        match overlays {
            Ok((markers, route)) => {
                effects.push(Effect::DrawOverlays { surface: self.surface.id, markers, route });
            }
            Err(e) => warn!(error = %e, "could not build overlays"),
        }
    }

    /// Emit a camera command if the surface is ready and has not already
    /// been sent this exact camera.
    fn apply(&mut self, effects: &mut Vec<Effect>) {
        if !self.surface.loaded {
            return;
        }
        let Some(position) = self.camera.position else {
            return;
        };
        let candidate = (self.surface.id, self.camera);
        if self.last_applied == Some(candidate) {
            return;
        }
        self.last_applied = Some(candidate);
        effects.push(Effect::SetCamera { surface: self.surface.id, position, zoom: self.camera.zoom });
    }
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod tests;
