//! # Engine Module
//!
//! Configuration, per-history physics and the batch machinery behind a simulation run.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - `SimulationInput`, its builder and run options
//! - **Context** ([`context`]) - The validated tissue, source and detector templates
//! - **Transport** ([`transport`], [`photon`]) - One photon history from launch to
//!   termination, emitting tally events
//! - **Randomness** ([`random`]) - Independent, reproducible streams derived from one seed
//! - **Tasks** ([`tasks`]) - Batches of histories accumulated into worker-local detectors
//! - **Progress & Cancellation** ([`progress`], [`cancellation`]) - Reporting hooks and a
//!   stop flag checked between batches
//! - **Error Handling** ([`error`]) - Driver-level errors
//!
//! Per-history numerical trouble never becomes an error: such histories end in
//! [`photon::PhotonState::Degenerate`], their tallies are dropped, and they are counted in
//! [`statistics::RunStatistics`].

pub mod cancellation;
pub mod config;
pub mod context;
pub mod error;
pub mod photon;
pub mod progress;
pub mod random;
pub mod statistics;
pub mod tasks;
pub mod transport;
