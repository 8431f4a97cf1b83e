//! # tissuemc Core Library
//!
//! A Monte Carlo photon-transport engine for layered biological tissue. Photon histories
//! are traced through a stack of planar regions with homogeneous optical properties, and
//! statistical detectors accumulate reflectance, transmittance, absorption and fluence.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless physics and data: optical properties, Fresnel
//!   and Henyey-Greenstein sampling, the layered tissue, source descriptions, detector
//!   accumulators and result I/O.
//!
//! - **[`engine`]: The Logic Core.** Run configuration, error types, progress reporting,
//!   random streams and the per-history transport engine that drives a photon from launch
//!   to termination.
//!
//! - **[`workflows`]: The Public API.** The simulation driver that partitions photon
//!   histories across workers and merges their detectors, and the forward-model interface
//!   through which external optimizers consume simulated observables.

pub mod core;
pub mod engine;
pub mod workflows;
