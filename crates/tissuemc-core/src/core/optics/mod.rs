//! # Optics Module
//!
//! Bulk optical properties and the elementary optical events a photon undergoes:
//! reflection and refraction at planar interfaces, and angular redistribution at
//! scattering sites.
//!
//! ## Key Components
//!
//! - [`properties`] - Validated absorption, scattering, anisotropy and refractive index
//! - [`fresnel`] - Unpolarized Fresnel reflectance and Snell refraction for z-normal planes
//! - [`scattering`] - Henyey-Greenstein polar sampling and direction rotation
//!
//! All functions that consume randomness take the uniform deviates as arguments, so they
//! remain deterministic and can be tested without a generator.

pub mod fresnel;
pub mod properties;
pub mod scattering;
