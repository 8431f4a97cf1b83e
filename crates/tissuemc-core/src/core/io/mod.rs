//! Reading and writing simulation results.
//!
//! Detector estimates are exchanged as one CSV table per detector, one row per bin, with
//! the bin edges alongside the statistics. Run metadata is written as TOML.

pub mod results;

pub use results::{DetectorRow, ResultsIoError};
