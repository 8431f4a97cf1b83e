//! Units of work executed by the simulation workflows.
//!
//! A batch is a fixed block of photon histories with its own random stream and its own
//! detector accumulators, so batches can run on any worker in any order and still merge
//! into the same result.

pub mod batch;
