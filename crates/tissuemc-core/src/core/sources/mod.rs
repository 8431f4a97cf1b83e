//! Photon sources.
//!
//! A [`SourceInput`] describes where photons are born and in which direction they start.
//! Once validated against a tissue it is read-only and shared by every worker; drawing a
//! launch state is a pure function of the description and the caller's random stream.

pub mod input;
pub mod launch;

pub use input::{AngularProfile, SourceError, SourceInput, SpatialProfile};
pub use launch::PhotonLaunch;
