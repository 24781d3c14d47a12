//! Map camera session for a waypoint map with switchable rendering providers.
//!
//! The [`coordinator::CameraCoordinator`] decides where the camera goes and
//! when; a [`session::Session`] feeds it signals from one queue and carries
//! out the effects it returns against the current rendering surface. Geometry
//! lives in the `viewport` crate.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`coordinator`] | Camera state machine: signals in, effects out |
//! | [`session`] | Async runtime driving one coordinator |
//! | [`surface`] | Rendering surface contract and surface generations |
//! | [`provider`] | Platforms, providers and initialization payloads |
//! | [`location`] | Live and cached location collaborators |
//! | [`config`] | Environment configuration |
//! | [`replay`] | JSON-lines host used by the `mapview` binary |

pub mod config;
pub mod coordinator;
pub mod location;
pub mod provider;
pub mod replay;
pub mod session;
pub mod surface;
