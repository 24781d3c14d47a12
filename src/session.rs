//! Session runtime: drives one coordinator from a single-consumer queue.
//!
//! DESIGN
//! ======
//! Every input (host calls, surface callbacks, finished location requests)
//! becomes a [`Signal`] on one bounded mpsc queue. [`Session::run`] is its only
//! consumer: it hands each signal to the coordinator and executes the returned
//! effects before taking the next one, so coordinator state is never touched
//! concurrently and no locks are needed.
//!
//! The live location request is the one suspension point. It runs as a
//! spawned task that posts its result back onto the queue; the coordinator
//! decides on arrival whether the result still matters.
//!
//! LIFETIME
//! ========
//! Surfaces hold weak senders. The loop ends once every [`SessionHandle`] is
//! dropped and no location request is outstanding.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use viewport::{ErrorCode, GeoPoint, Waypoint};

use crate::coordinator::{CameraCoordinator, Effect, LocationTicket, Signal};
use crate::location::{LocationError, LocationService};
use crate::provider::Provider;
use crate::surface::{RenderSurface, SurfaceEvents, SurfaceFactory, SurfaceId};

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session loop has ended; its queue no longer accepts signals.
    #[error("session closed")]
    Closed,
    /// A replayed host event could not be parsed.
    #[error("invalid host event on line {line}: {source}")]
    InvalidEvent { line: usize, source: serde_json::Error },
    /// A replayed event referenced a surface that was never created.
    #[error("timed out waiting for {0}")]
    SurfaceTimeout(SurfaceId),
    /// A replayed event needed the newest surface before any was built.
    #[error("timed out waiting for any surface")]
    NoSurface,
    #[error("i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Closed => "E_SESSION_CLOSED",
            Self::InvalidEvent { .. } => "E_INVALID_EVENT",
            Self::SurfaceTimeout(_) | Self::NoSurface => "E_SURFACE_TIMEOUT",
            Self::Io(_) => "E_IO",
        }
    }
}

// =============================================================================
// REPORTS
// =============================================================================

/// Notifications for the embedding UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionReport {
    /// A surface finished loading.
    MapReady { surface: SurfaceId, provider: Provider },
    /// A live location request failed. Not retried.
    LocationFailed(LocationError),
}

/// Counters returned when the session loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub signals: usize,
    pub cameras_applied: usize,
    pub surfaces_created: usize,
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cloneable sender into a session's queue.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Signal>,
}

impl SessionHandle {
    /// Deliver a raw signal.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has ended.
    pub async fn send(&self, signal: Signal) -> Result<(), SessionError> {
        self.tx.send(signal).await.map_err(|_| SessionError::Closed)
    }

    /// Replace the waypoints and route.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has ended.
    pub async fn set_waypoints(&self, waypoints: Vec<Waypoint>, route: Option<Vec<GeoPoint>>) -> Result<(), SessionError> {
        self.send(Signal::WaypointsChanged { waypoints, route }).await
    }

    /// Switch to another rendering backend.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has ended.
    pub async fn select_provider(&self, provider: Provider) -> Result<(), SessionError> {
        self.send(Signal::ProviderSelected(provider)).await
    }

    /// Offer the cached last-known location.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has ended.
    pub async fn cached_location(&self, point: GeoPoint) -> Result<(), SessionError> {
        self.send(Signal::CachedLocation(point)).await
    }

    /// Tell the session its screen regained focus.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has ended.
    pub async fn focus(&self) -> Result<(), SessionError> {
        self.send(Signal::Focused).await
    }
}

// =============================================================================
// SESSION
// =============================================================================

pub struct Session {
    id: Uuid,
    coordinator: CameraCoordinator,
    surfaces: Arc<dyn SurfaceFactory>,
    location: Arc<dyn LocationService>,
    surface: Option<(SurfaceId, Box<dyn RenderSurface>)>,
    weak_tx: mpsc::WeakSender<Signal>,
    rx: mpsc::Receiver<Signal>,
    reports: Option<mpsc::UnboundedSender<SessionReport>>,
    summary: SessionSummary,
}

impl Session {
    /// Create a session and the handle that feeds it.
    #[must_use]
    pub fn new(
        coordinator: CameraCoordinator,
        surfaces: Arc<dyn SurfaceFactory>,
        location: Arc<dyn LocationService>,
        queue_capacity: usize,
    ) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let session = Self {
            id: Uuid::new_v4(),
            coordinator,
            surfaces,
            location,
            surface: None,
            weak_tx: tx.downgrade(),
            rx,
            reports: None,
            summary: SessionSummary::default(),
        };
        (session, SessionHandle { tx })
    }

    /// Forward map-ready and location-failure notifications to `reports`.
    #[must_use]
    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<SessionReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Process signals until every handle is gone.
    pub async fn run(mut self) -> SessionSummary {
        info!(session = %self.id, provider = %self.coordinator.active_provider(), "session started");
        let effects = self.coordinator.bootstrap();
        self.execute(effects);

        while let Some(signal) = self.rx.recv().await {
            self.summary.signals += 1;
            let effects = self.coordinator.handle(signal);
            self.execute(effects);
        }

        info!(
            session = %self.id,
            signals = self.summary.signals,
            cameras_applied = self.summary.cameras_applied,
            surfaces_created = self.summary.surfaces_created,
            "session ended"
        );
        self.summary
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::InitializeSurface { surface, provider, init } => {
                    // Retire the old surface before its replacement exists.
                    self.surface = None;
                    let events = SurfaceEvents::new(surface, self.weak_tx.clone());
                    let built = self.surfaces.create(surface, provider, &init, events);
                    self.surface = Some((surface, built));
                    self.summary.surfaces_created += 1;
                    info!(session = %self.id, %surface, %provider, "surface initialized");
                }
                Effect::SetCamera { surface, position, zoom } => match &mut self.surface {
                    Some((current, target)) if *current == surface => {
                        debug!(session = %self.id, %surface, zoom, "set camera");
                        target.set_camera(position, zoom);
                        self.summary.cameras_applied += 1;
                    }
                    _ => warn!(session = %self.id, %surface, "dropping camera command for retired surface"),
                },
                Effect::DrawOverlays { surface, markers, route } => match &mut self.surface {
                    Some((current, target)) if *current == surface => {
                        target.draw_overlays(&markers, route.as_ref());
                    }
                    _ => debug!(session = %self.id, %surface, "dropping overlays for retired surface"),
                },
                Effect::RequestLocation { ticket } => self.spawn_location_request(ticket),
                Effect::LocationFailed(e) => {
                    warn!(session = %self.id, error = %e, code = e.error_code(), "location unavailable");
                    self.report(SessionReport::LocationFailed(e));
                }
                Effect::MapReady { surface, provider } => {
                    self.report(SessionReport::MapReady { surface, provider });
                }
            }
        }
    }

    fn spawn_location_request(&self, ticket: LocationTicket) {
        let Some(tx) = self.weak_tx.upgrade() else {
            return;
        };
        let location = Arc::clone(&self.location);
        let session = self.id;
        tokio::spawn(async move {
            let result = location.current_location().await;
            if tx.send(Signal::LocationResolved { ticket, result }).await.is_err() {
                debug!(%session, ticket = ticket.0, "session ended before location fix arrived");
            }
        });
    }

    fn report(&self, report: SessionReport) {
        if let Some(reports) = &self.reports {
            if reports.send(report).is_err() {
                debug!(session = %self.id, "report receiver dropped");
            }
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
