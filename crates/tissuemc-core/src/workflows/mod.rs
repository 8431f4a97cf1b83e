//! # Workflows Module
//!
//! Public entry points built on the engine.
//!
//! - **Simulation** ([`simulate`]) - Validates a [`SimulationInput`](crate::engine::config::SimulationInput),
//!   runs all photon histories in parallel batches, and returns finalized detector results
//! - **Forward Model** ([`forward_model`]) - A parameter-vector-to-prediction interface and a
//!   weighted least-squares objective for use by external optimizers

pub mod forward_model;
pub mod simulate;
