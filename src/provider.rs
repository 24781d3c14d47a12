//! Rendering providers and their initialization.
//!
//! DESIGN
//! ======
//! Which backends exist is a pure function of the host platform. Everything a
//! backend needs to start (the provider chosen for each platform slot plus
//! vendor credentials) travels in an explicit [`ProviderInit`] value attached
//! to the surface-initialization effect. Nothing is configured globally.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

// =============================================================================
// PLATFORM
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "android" => Ok(Self::Android),
            "ios" => Ok(Self::Ios),
            other => Err(ConfigError::UnknownPlatform(other.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Android => "android",
            Self::Ios => "ios",
        })
    }
}

// =============================================================================
// PROVIDER
// =============================================================================

/// Opaque handle of a rendering backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    GoogleMaps,
    #[serde(rename = "GoogleMapsIOS")]
    GoogleMapsIos,
    AppleMaps,
    OpenStreetMap,
    Mapbox,
    AzureMaps,
}

impl Provider {
    /// Name the rendering surface reports in its `loaded` event.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::GoogleMaps => "GoogleMaps",
            Self::GoogleMapsIos => "GoogleMapsIOS",
            Self::AppleMaps => "AppleMaps",
            Self::OpenStreetMap => "OpenStreetMap",
            Self::Mapbox => "Mapbox",
            Self::AzureMaps => "AzureMaps",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_PROVIDERS
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownProvider(s.to_string()))
    }
}

const ALL_PROVIDERS: [Provider; 6] = [
    Provider::GoogleMaps,
    Provider::GoogleMapsIos,
    Provider::AppleMaps,
    Provider::OpenStreetMap,
    Provider::Mapbox,
    Provider::AzureMaps,
];

const ANDROID_PROVIDERS: [Provider; 4] =
    [Provider::GoogleMaps, Provider::OpenStreetMap, Provider::Mapbox, Provider::AzureMaps];

const IOS_PROVIDERS: [Provider; 2] = [Provider::GoogleMapsIos, Provider::AppleMaps];

/// Backends selectable on `platform`, in menu order.
#[must_use]
pub fn available_providers(platform: Platform) -> &'static [Provider] {
    match platform {
        Platform::Android => &ANDROID_PROVIDERS,
        Platform::Ios => &IOS_PROVIDERS,
    }
}

/// Backend a fresh session starts with.
#[must_use]
pub fn default_provider(platform: Platform) -> Provider {
    match platform {
        Platform::Android => Provider::GoogleMaps,
        Platform::Ios => Provider::AppleMaps,
    }
}

// =============================================================================
// INITIALIZATION
// =============================================================================

/// Vendor credentials handed to backends that need them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub mapbox_public_token: Option<String>,
    pub azure_maps_subscription_key: Option<String>,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ProviderCredentials")
            .field("mapbox_public_token", &redact(&self.mapbox_public_token))
            .field("azure_maps_subscription_key", &redact(&self.azure_maps_subscription_key))
            .finish()
    }
}

/// Everything the rendering collaborator needs to (re)initialize.
///
/// `ios` serves iOS hosts; `gms` and `non_gms` serve Android devices with and
/// without Google Play services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInit {
    pub ios: Provider,
    pub gms: Provider,
    pub non_gms: Provider,
    /// Present on Android only; iOS backends need no tokens.
    pub credentials: Option<ProviderCredentials>,
}

/// Provider catalogue for one host platform.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    platform: Platform,
    credentials: ProviderCredentials,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new(platform: Platform, credentials: ProviderCredentials) -> Self {
        Self { platform, credentials }
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    #[must_use]
    pub fn available(&self) -> &'static [Provider] {
        available_providers(self.platform)
    }

    #[must_use]
    pub fn is_available(&self, provider: Provider) -> bool {
        self.available().contains(&provider)
    }

    #[must_use]
    pub fn default_provider(&self) -> Provider {
        default_provider(self.platform)
    }

    /// Resolve the name reported by a loaded surface.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<Provider> {
        self.available().iter().copied().find(|p| p.name() == name)
    }

    /// Initialization used when a session first builds its surface.
    #[must_use]
    pub fn default_init(&self) -> ProviderInit {
        ProviderInit {
            ios: Provider::AppleMaps,
            gms: Provider::GoogleMaps,
            non_gms: Provider::OpenStreetMap,
            credentials: self.platform_credentials(),
        }
    }

    /// Initialization after the user selects `selected`: every slot serving
    /// this platform takes it, the others keep their defaults.
    #[must_use]
    pub fn init_for(&self, selected: Provider) -> ProviderInit {
        let defaults = self.default_init();
        match self.platform {
            Platform::Ios => ProviderInit { ios: selected, ..defaults },
            Platform::Android => ProviderInit { gms: selected, non_gms: selected, ..defaults },
        }
    }

    fn platform_credentials(&self) -> Option<ProviderCredentials> {
        match self.platform {
            Platform::Android => Some(self.credentials.clone()),
            Platform::Ios => None,
        }
    }
}

#[cfg(test)]
#[path = "provider_test.rs"]
mod tests;
