//! # Core Module
//!
//! This module provides the physical building blocks of the simulator: everything that can
//! be described without running a photon history.
//!
//! ## Architecture
//!
//! - **Optics** ([`optics`]) - Optical properties, Fresnel reflection, Snell refraction and
//!   Henyey-Greenstein scattering
//! - **Tissue Geometry** ([`tissue`]) - Ordered stacks of planar regions covering the z axis
//! - **Sources** ([`sources`]) - Launch descriptions for point, directional and area sources
//! - **Detectors** ([`detectors`]) - Binned tallies with second-moment tracking
//! - **File I/O** ([`io`]) - Export of finalized detector results

pub mod detectors;
pub mod io;
pub mod optics;
pub mod sources;
pub mod tissue;
