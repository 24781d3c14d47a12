//! Session configuration from environment variables.
//!
//! Every key has a typed default. A key that is set but malformed is an
//! error rather than a silent fallback, so a typo in `.env` surfaces at
//! startup instead of as a misplaced camera.
//!
//! Keys:
//! - `MAPVIEW_PLATFORM`: `android` (default) or `ios`
//! - `MAPVIEW_PROVIDER`: provider name; default is the platform default
//! - `MAPVIEW_DEFAULT_ZOOM`: default 15
//! - `MAPVIEW_INITIAL_ZOOM`: zoom carried over from a previous screen
//! - `MAPVIEW_INITIAL_LOCATION`: `lon,lat` carried over from a previous screen
//! - `MAPVIEW_CACHED_LOCATION`: `lon,lat` last-known location
//! - `MAPVIEW_DEVICE_LOCATION`: `lon,lat` answered by the location service
//! - `MAPVIEW_QUEUE_CAPACITY`: default 64
//! - `MAPBOX_PUBLIC_TOKEN`, `AZURE_MAPS_SUBSCRIPTION_KEY`: vendor credentials

use std::str::FromStr;

use viewport::consts::DEFAULT_ZOOM;
use viewport::{ErrorCode, FitError, GeoPoint};

use crate::coordinator::InitialCamera;
use crate::provider::{Platform, Provider, ProviderCredentials, ProviderRegistry};
use crate::session::DEFAULT_QUEUE_CAPACITY;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),
    #[error("unknown map provider: {0}")]
    UnknownProvider(String),
    #[error("{provider} is not offered on {platform}")]
    ProviderUnavailable { provider: Provider, platform: Platform },
    #[error("{key} is not a valid number: {value}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} is not a `lon,lat` pair: {value}")]
    InvalidCoordinate { key: &'static str, value: String },
    #[error("{key} is out of range: {source}")]
    OutOfRange { key: &'static str, source: FitError },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownPlatform(_) => "E_UNKNOWN_PLATFORM",
            Self::UnknownProvider(_) => "E_UNKNOWN_PROVIDER",
            Self::ProviderUnavailable { .. } => "E_PROVIDER_UNAVAILABLE",
            Self::InvalidNumber { .. } => "E_INVALID_NUMBER",
            Self::InvalidCoordinate { .. } | Self::OutOfRange { .. } => "E_INVALID_COORDINATE",
        }
    }
}

/// Resolved settings for one map session.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub platform: Platform,
    /// Explicit provider choice. `None` means the platform default.
    pub provider: Option<Provider>,
    pub default_zoom: f64,
    pub initial_zoom: Option<f64>,
    pub initial_location: Option<GeoPoint>,
    pub cached_location: Option<GeoPoint>,
    pub device_location: Option<GeoPoint>,
    pub queue_capacity: usize,
    pub credentials: ProviderCredentials,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            platform: Platform::Android,
            provider: None,
            default_zoom: DEFAULT_ZOOM,
            initial_zoom: None,
            initial_location: None,
            cached_location: None,
            device_location: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            credentials: ProviderCredentials::default(),
        }
    }
}

impl MapConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any key that is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a key to its value.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any key that is set but malformed.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let platform = get("MAPVIEW_PLATFORM")
            .map(|v| v.parse::<Platform>())
            .transpose()?
            .unwrap_or(Platform::Android);
        let provider = get("MAPVIEW_PROVIDER").map(|v| v.parse::<Provider>()).transpose()?;

        Ok(Self {
            platform,
            provider,
            default_zoom: parse_number("MAPVIEW_DEFAULT_ZOOM", get("MAPVIEW_DEFAULT_ZOOM"))?.unwrap_or(DEFAULT_ZOOM),
            initial_zoom: parse_number("MAPVIEW_INITIAL_ZOOM", get("MAPVIEW_INITIAL_ZOOM"))?,
            initial_location: parse_point("MAPVIEW_INITIAL_LOCATION", get("MAPVIEW_INITIAL_LOCATION"))?,
            cached_location: parse_point("MAPVIEW_CACHED_LOCATION", get("MAPVIEW_CACHED_LOCATION"))?,
            device_location: parse_point("MAPVIEW_DEVICE_LOCATION", get("MAPVIEW_DEVICE_LOCATION"))?,
            queue_capacity: parse_number("MAPVIEW_QUEUE_CAPACITY", get("MAPVIEW_QUEUE_CAPACITY"))?
                .unwrap_or(DEFAULT_QUEUE_CAPACITY),
            credentials: ProviderCredentials {
                mapbox_public_token: get("MAPBOX_PUBLIC_TOKEN"),
                azure_maps_subscription_key: get("AZURE_MAPS_SUBSCRIPTION_KEY"),
            },
        })
    }

    #[must_use]
    pub fn registry(&self) -> ProviderRegistry {
        ProviderRegistry::new(self.platform, self.credentials.clone())
    }

    /// The provider the session starts on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ProviderUnavailable`] if the configured provider
    /// is not offered on the configured platform.
    pub fn starting_provider(&self) -> Result<Provider, ConfigError> {
        let registry = self.registry();
        match self.provider {
            None => Ok(registry.default_provider()),
            Some(p) if registry.is_available(p) => Ok(p),
            Some(p) => Err(ConfigError::ProviderUnavailable { provider: p, platform: self.platform }),
        }
    }

    #[must_use]
    pub fn initial_camera(&self) -> InitialCamera {
        InitialCamera { location: self.initial_location, zoom: self.initial_zoom }
    }
}

fn parse_number<T: FromStr>(key: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError> {
    raw.map(|value| value.parse::<T>().map_err(|_| ConfigError::InvalidNumber { key, value }))
        .transpose()
}

/// Parse a `lon,lat` pair.
fn parse_point(key: &'static str, raw: Option<String>) -> Result<Option<GeoPoint>, ConfigError> {
    let Some(value) = raw else {
        return Ok(None);
    };
    let parsed = value
        .split_once(',')
        .and_then(|(lon, lat)| Some((lon.trim().parse::<f64>().ok()?, lat.trim().parse::<f64>().ok()?)));
    let Some((lon, lat)) = parsed else {
        return Err(ConfigError::InvalidCoordinate { key, value });
    };
    GeoPoint::try_new(lon, lat)
        .map(Some)
        .map_err(|source| ConfigError::OutOfRange { key, source })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
