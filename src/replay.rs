//! JSON-lines replay host.
//!
//! Stands in for the UI layer: reads host events (one JSON object per line),
//! feeds them to a session, and traces every command the session issues to
//! its rendering surfaces.
//!
//! EVENT FORMAT
//! ============
//! ```text
//! {"type":"waypoints","waypoints":[{"id":"a","coordinate":[-122,37]}],"route":[[-122,37]]}
//! {"type":"layout","width":300}
//! {"type":"loaded","provider":"GoogleMaps","surface":0}
//! {"type":"select_provider","provider":"OpenStreetMap"}
//! {"type":"cached_location","location":[-122.4,37.7]}
//! {"type":"focus"}
//! ```
//! `layout` and `loaded` are surface callbacks. `surface` picks the surface
//! generation to speak for; without it the most recently built surface is
//! used. Blank lines and lines starting with `#` are skipped.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, watch};
use tracing::debug;
use viewport::markers::{MarkerSpec, PolylineSpec};
use viewport::{GeoPoint, Waypoint};

use crate::provider::{Provider, ProviderInit};
use crate::session::{SessionError, SessionHandle};
use crate::surface::{RenderSurface, SurfaceEvents, SurfaceFactory, SurfaceId};

/// How long a surface callback waits for its surface to be built.
pub const DEFAULT_SURFACE_WAIT: Duration = Duration::from_secs(5);

// =============================================================================
// HOST EVENTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    Waypoints {
        waypoints: Vec<Waypoint>,
        #[serde(default)]
        route: Option<Vec<GeoPoint>>,
    },
    Layout {
        #[serde(default)]
        surface: Option<u64>,
        width: f64,
    },
    Loaded {
        #[serde(default)]
        surface: Option<u64>,
        provider: String,
    },
    SelectProvider {
        provider: Provider,
    },
    CachedLocation {
        location: GeoPoint,
    },
    Focus,
}

/// Parse one input line. `Ok(None)` for blank and comment lines.
///
/// # Errors
///
/// Returns [`SessionError::InvalidEvent`] if the line is not a host event.
pub fn parse_event(line: &str, line_no: usize) -> Result<Option<HostEvent>, SessionError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|source| SessionError::InvalidEvent { line: line_no, source })
}

// =============================================================================
// TRACE SURFACE
// =============================================================================

/// A command the session issued to a surface, as written to the trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SurfaceCommand {
    SetCamera { surface: u64, provider: Provider, position: GeoPoint, zoom: f64 },
    DrawOverlays { surface: u64, markers: Vec<MarkerSpec>, route: Option<PolylineSpec> },
}

struct TraceSurface {
    id: SurfaceId,
    provider: Provider,
    commands: mpsc::UnboundedSender<SurfaceCommand>,
}

impl TraceSurface {
    fn emit(&self, command: SurfaceCommand) {
        if self.commands.send(command).is_err() {
            debug!(surface = %self.id, "trace receiver dropped");
        }
    }
}

impl RenderSurface for TraceSurface {
    fn set_camera(&mut self, position: GeoPoint, zoom: f64) {
        self.emit(SurfaceCommand::SetCamera { surface: self.id.0, provider: self.provider, position, zoom });
    }

    fn draw_overlays(&mut self, markers: &[MarkerSpec], route: Option<&PolylineSpec>) {
        self.emit(SurfaceCommand::DrawOverlays {
            surface: self.id.0,
            markers: markers.to_vec(),
            route: route.cloned(),
        });
    }
}

/// Builds [`TraceSurface`]s and publishes each one's event sender to a
/// [`SurfaceTracker`] so replayed callbacks can speak for it.
pub struct TraceSurfaceFactory {
    commands: mpsc::UnboundedSender<SurfaceCommand>,
    built: watch::Sender<Vec<SurfaceEvents>>,
}

impl TraceSurfaceFactory {
    #[must_use]
    pub fn new(commands: mpsc::UnboundedSender<SurfaceCommand>) -> (Self, SurfaceTracker) {
        let (built, rx) = watch::channel(Vec::new());
        (Self { commands, built }, SurfaceTracker { rx })
    }
}

impl SurfaceFactory for TraceSurfaceFactory {
    fn create(
        &self,
        id: SurfaceId,
        provider: Provider,
        init: &ProviderInit,
        events: SurfaceEvents,
    ) -> Box<dyn RenderSurface> {
        debug!(surface = %id, %provider, ?init, "building trace surface");
        self.built.send_modify(|all| all.push(events));
        Box::new(TraceSurface { id, provider, commands: self.commands.clone() })
    }
}

/// Every surface the factory has built, in creation order.
pub struct SurfaceTracker {
    rx: watch::Receiver<Vec<SurfaceEvents>>,
}

impl SurfaceTracker {
    /// Event sender for surface `id`, or for the newest surface when `id` is
    /// `None`. Waits up to `wait` for the surface to be built.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SurfaceTimeout`] if surface `id` is not built in
    /// time, [`SessionError::NoSurface`] if no surface at all is built in time,
    /// or [`SessionError::Closed`] if the factory is gone.
    pub async fn events(&mut self, id: Option<SurfaceId>, wait: Duration) -> Result<SurfaceEvents, SessionError> {
        let pick = |all: &Vec<SurfaceEvents>| match id {
            Some(want) => all.iter().find(|e| e.id() == want).cloned(),
            None => all.last().cloned(),
        };
        let found = tokio::time::timeout(wait, self.rx.wait_for(|all| pick(all).is_some()))
            .await
            .map_err(|_| id.map_or(SessionError::NoSurface, SessionError::SurfaceTimeout))?
            .map_err(|_| SessionError::Closed)?;
        pick(&*found).ok_or(SessionError::Closed)
    }
}

// =============================================================================
// REPLAY
// =============================================================================

/// Feed every event from `reader` to the session. Returns the number of events
/// replayed.
///
/// # Errors
///
/// Stops at the first unreadable line, unparseable event, missing surface, or
/// closed session.
pub async fn replay<R>(
    reader: R,
    handle: &SessionHandle,
    tracker: &mut SurfaceTracker,
    wait: Duration,
) -> Result<usize, SessionError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0_usize;
    let mut replayed = 0_usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let Some(event) = parse_event(&line, line_no)? else {
            continue;
        };
        debug!(line = line_no, ?event, "replaying host event");
        dispatch(event, handle, tracker, wait).await?;
        replayed += 1;
    }
    Ok(replayed)
}

async fn dispatch(
    event: HostEvent,
    handle: &SessionHandle,
    tracker: &mut SurfaceTracker,
    wait: Duration,
) -> Result<(), SessionError> {
    match event {
        HostEvent::Waypoints { waypoints, route } => handle.set_waypoints(waypoints, route).await,
        HostEvent::Layout { surface, width } => {
            tracker.events(surface.map(SurfaceId), wait).await?.layout_width(width).await
        }
        HostEvent::Loaded { surface, provider } => {
            tracker.events(surface.map(SurfaceId), wait).await?.loaded(provider).await
        }
        HostEvent::SelectProvider { provider } => handle.select_provider(provider).await,
        HostEvent::CachedLocation { location } => handle.cached_location(location).await,
        HostEvent::Focus => handle.focus().await,
    }
}

#[cfg(test)]
#[path = "replay_test.rs"]
mod tests;
