//! Location collaborators: the live device location service and the cached
//! last-known location from a prior session.

use viewport::{ErrorCode, GeoPoint};

/// Errors produced by a [`LocationService`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// No fix could be obtained (permissions, no signal, timeout).
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

impl ErrorCode for LocationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "E_LOCATION_UNAVAILABLE",
        }
    }
}

/// Live device location. Enables mocking in tests.
#[async_trait::async_trait]
pub trait LocationService: Send + Sync {
    /// Resolve the device's current position.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Unavailable`] when no fix can be obtained.
    async fn current_location(&self) -> Result<GeoPoint, LocationError>;
}

/// Read-only, possibly absent last-known location.
pub trait CachedLocationStore: Send + Sync {
    fn last_known(&self) -> Option<GeoPoint>;
}

/// Location service answering with a configured fix, or failing when none is set.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Option<GeoPoint>);

#[async_trait::async_trait]
impl LocationService for FixedLocation {
    async fn current_location(&self) -> Result<GeoPoint, LocationError> {
        self.0
            .ok_or_else(|| LocationError::Unavailable("no device location configured".into()))
    }
}

/// Cached location held in memory, typically loaded from configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCachedLocation(pub Option<GeoPoint>);

impl CachedLocationStore for StaticCachedLocation {
    fn last_known(&self) -> Option<GeoPoint> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_location_returns_configured_fix() {
        let p = GeoPoint::new(13.4, 52.5);
        assert_eq!(FixedLocation(Some(p)).current_location().await.unwrap(), p);
    }

    #[tokio::test]
    async fn fixed_location_without_fix_is_unavailable() {
        let err = FixedLocation(None).current_location().await.unwrap_err();
        assert!(matches!(err, LocationError::Unavailable(_)));
        assert_eq!(err.error_code(), "E_LOCATION_UNAVAILABLE");
        assert!(!err.retryable());
    }

    #[test]
    fn static_cache_reports_value() {
        assert_eq!(StaticCachedLocation::default().last_known(), None);
        let p = GeoPoint::new(1.0, 2.0);
        assert_eq!(StaticCachedLocation(Some(p)).last_known(), Some(p));
    }
}
