use super::config::{ConfigError, SimulationInput, SimulationOptions};
use crate::core::detectors::DetectorSet;
use crate::core::sources::SourceInput;
use crate::core::tissue::LayeredTissue;
use std::collections::HashSet;

/// The validated, read-only state shared by every batch of a run.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub photon_count: u64,
    pub output_name: String,
    pub tissue: LayeredTissue,
    pub source: SourceInput,
    pub detectors: DetectorSet,
    pub options: SimulationOptions,
}

impl SimulationContext {
    pub fn new(input: SimulationInput) -> Result<Self, ConfigError> {
        if input.photon_count == 0 {
            return Err(ConfigError::InvalidPhotonCount(input.photon_count));
        }
        input.options.validate()?;

        let tissue = LayeredTissue::new(input.tissue)?;
        let source = input.source.validated(&tissue)?;

        let mut names = HashSet::new();
        for detector in &input.detectors {
            if !names.insert(detector.name.as_str()) {
                return Err(ConfigError::DuplicateDetectorName(detector.name.clone()));
            }
        }
        let detectors = DetectorSet::new(&input.detectors)?;

        Ok(Self {
            photon_count: input.photon_count,
            output_name: input.output_name,
            tissue,
            source,
            detectors,
            options: input.options,
        })
    }
}
