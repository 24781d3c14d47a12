//! Rendering surface contract.
//!
//! A surface is one instance of a provider's map view. It is rebuilt on every
//! provider switch; each instance gets a fresh [`SurfaceId`] and a
//! [`SurfaceEvents`] sender that tags what it reports with that id.

use std::fmt;

use tokio::sync::mpsc;
use viewport::GeoPoint;
use viewport::markers::{MarkerSpec, PolylineSpec};

use crate::coordinator::Signal;
use crate::provider::{Provider, ProviderInit};
use crate::session::SessionError;

/// Generation number of a rendering surface instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SurfaceId(pub u64);

impl SurfaceId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Commands accepted by a live map view.
pub trait RenderSurface: Send {
    /// Move the camera.
    fn set_camera(&mut self, position: GeoPoint, zoom: f64);

    /// Replace the waypoint markers and route polyline.
    fn draw_overlays(&mut self, markers: &[MarkerSpec], route: Option<&PolylineSpec>);
}

/// Builds a surface for a provider. Called once per (re)initialization.
pub trait SurfaceFactory: Send + Sync {
    fn create(
        &self,
        id: SurfaceId,
        provider: Provider,
        init: &ProviderInit,
        events: SurfaceEvents,
    ) -> Box<dyn RenderSurface>;
}

/// Event channel handed to a surface instance.
///
/// Holds only a weak reference to the session queue so a surface never keeps
/// a finished session alive.
#[derive(Clone)]
pub struct SurfaceEvents {
    id: SurfaceId,
    tx: mpsc::WeakSender<Signal>,
}

impl SurfaceEvents {
    pub(crate) fn new(id: SurfaceId, tx: mpsc::WeakSender<Signal>) -> Self {
        Self { id, tx }
    }

    #[must_use]
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Report that this surface finished loading with the named provider.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has ended.
    pub async fn loaded(&self, provider_name: impl Into<String>) -> Result<(), SessionError> {
        self.send(Signal::SurfaceLoaded { surface: self.id, provider_name: provider_name.into() })
            .await
    }

    /// Report the surface's display width in pixels.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has ended.
    pub async fn layout_width(&self, px: f64) -> Result<(), SessionError> {
        self.send(Signal::LayoutWidth { surface: self.id, px }).await
    }

    async fn send(&self, signal: Signal) -> Result<(), SessionError> {
        let tx = self.tx.upgrade().ok_or(SessionError::Closed)?;
        tx.send(signal).await.map_err(|_| SessionError::Closed)
    }
}
