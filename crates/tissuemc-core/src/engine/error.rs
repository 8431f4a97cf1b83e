use crate::core::detectors::DetectorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Simulation was cancelled after {completed_batches} of {total_batches} batches")]
    Cancelled {
        completed_batches: u64,
        total_batches: u64,
    },

    #[error("Detector accumulation failed: {source}")]
    Detector {
        #[from]
        source: DetectorError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
