use crate::core::detectors::{DetectorError, DetectorInput};
use crate::core::optics::properties::OpticalPropertiesError;
use crate::core::sources::{SourceError, SourceInput};
use crate::core::tissue::{TissueError, TissueRegion};
use crate::engine::random::MAX_SEED;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Photon count must be positive, got {0}")]
    InvalidPhotonCount(u64),

    #[error("Invalid simulation options: {0}")]
    InvalidOptions(String),

    #[error("Detector name '{0}' is used by more than one detector")]
    DuplicateDetectorName(String),

    #[error("Invalid tissue: {0}")]
    Tissue(#[from] TissueError),

    #[error("Invalid source: {0}")]
    Source(#[from] SourceError),

    #[error("Invalid detector: {0}")]
    Detector(#[from] DetectorError),

    #[error("Invalid optical properties: {0}")]
    OpticalProperties(#[from] OpticalPropertiesError),
}

/// How a photon's statistical weight responds to absorption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbsorptionWeightingType {
    /// Survival roulette at each interaction; weight stays 1 until the photon dies.
    #[default]
    Analog,
    /// A fraction `mua / mut` of the weight is deposited at each interaction site.
    Discrete,
    /// Weight decays as `exp(-mua * l)` along every path segment.
    Continuous,
}

impl fmt::Display for AbsorptionWeightingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Analog => "analog",
            Self::Discrete => "discrete",
            Self::Continuous => "continuous",
        };
        f.write_str(name)
    }
}

impl FromStr for AbsorptionWeightingType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "analog" | "ana" => Ok(Self::Analog),
            "discrete" | "daw" => Ok(Self::Discrete),
            "continuous" | "caw" => Ok(Self::Continuous),
            other => Err(ConfigError::InvalidOptions(format!(
                "unknown absorption weighting '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouletteOptions {
    /// Photons lighter than this play roulette. Zero disables roulette.
    pub weight_threshold: f64,
    /// Probability of surviving a roulette round.
    pub survival_chance: f64,
}

impl Default for RouletteOptions {
    fn default() -> Self {
        Self {
            weight_threshold: 1e-4,
            survival_chance: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationOptions {
    pub absorption_weighting: AbsorptionWeightingType,
    pub seed: Option<u64>,
    pub roulette: RouletteOptions,
    pub max_collisions: u64,
    pub batch_size: u64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            absorption_weighting: AbsorptionWeightingType::Analog,
            seed: None,
            roulette: RouletteOptions::default(),
            max_collisions: 100_000,
            batch_size: 1_000,
        }
    }
}

impl SimulationOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let RouletteOptions {
            weight_threshold,
            survival_chance,
        } = self.roulette;
        if !(0.0..1.0).contains(&weight_threshold) {
            return Err(ConfigError::InvalidOptions(format!(
                "roulette weight threshold must lie in [0, 1), got {weight_threshold}"
            )));
        }
        if !(survival_chance > 0.0 && survival_chance <= 1.0) {
            return Err(ConfigError::InvalidOptions(format!(
                "roulette survival chance must lie in (0, 1], got {survival_chance}"
            )));
        }
        if weight_threshold > survival_chance {
            return Err(ConfigError::InvalidOptions(format!(
                "roulette weight threshold {weight_threshold} exceeds survival chance {survival_chance}; survivors would gain weight above 1"
            )));
        }
        if let Some(seed) = self.seed.filter(|&seed| seed > MAX_SEED) {
            return Err(ConfigError::InvalidOptions(format!(
                "seed {seed} exceeds the largest supported seed {MAX_SEED}"
            )));
        }
        if self.max_collisions == 0 {
            return Err(ConfigError::InvalidOptions(
                "max collisions must be positive".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidOptions(
                "batch size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything needed to run one simulation. Built once and never mutated during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationInput {
    pub photon_count: u64,
    pub output_name: String,
    pub tissue: Vec<TissueRegion>,
    pub source: SourceInput,
    pub detectors: Vec<DetectorInput>,
    pub options: SimulationOptions,
}

impl SimulationInput {
    pub fn builder() -> SimulationInputBuilder {
        SimulationInputBuilder::new()
    }
}

#[derive(Default)]
pub struct SimulationInputBuilder {
    photon_count: Option<u64>,
    output_name: Option<String>,
    tissue: Option<Vec<TissueRegion>>,
    source: Option<SourceInput>,
    detectors: Vec<DetectorInput>,
    options: Option<SimulationOptions>,
}

impl SimulationInputBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn photon_count(mut self, count: u64) -> Self {
        self.photon_count = Some(count);
        self
    }
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }
    pub fn tissue(mut self, regions: Vec<TissueRegion>) -> Self {
        self.tissue = Some(regions);
        self
    }
    pub fn source(mut self, source: SourceInput) -> Self {
        self.source = Some(source);
        self
    }
    pub fn detector(mut self, detector: DetectorInput) -> Self {
        self.detectors.push(detector);
        self
    }
    pub fn detectors(mut self, detectors: impl IntoIterator<Item = DetectorInput>) -> Self {
        self.detectors.extend(detectors);
        self
    }
    pub fn options(mut self, options: SimulationOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Assembles the input. Only missing parameters are reported here; physical consistency
    /// is checked when the simulation is constructed.
    pub fn build(self) -> Result<SimulationInput, ConfigError> {
        Ok(SimulationInput {
            photon_count: self
                .photon_count
                .ok_or(ConfigError::MissingParameter("photon_count"))?,
            output_name: self
                .output_name
                .unwrap_or_else(|| "results".to_string()),
            tissue: self.tissue.ok_or(ConfigError::MissingParameter("tissue"))?,
            source: self.source.unwrap_or_default(),
            detectors: self.detectors,
            options: self.options.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::detectors::DetectorKind;
    use crate::core::optics::properties::OpticalProperties;

    fn regions() -> Vec<TissueRegion> {
        let air = OpticalProperties::ambient(1.0).unwrap();
        vec![
            TissueRegion::layer(f64::NEG_INFINITY, 0.0, air),
            TissueRegion::layer(0.0, 10.0, OpticalProperties::new(0.01, 1.0, 0.8, 1.4).unwrap()),
            TissueRegion::layer(10.0, f64::INFINITY, air),
        ]
    }

    #[test]
    fn builder_reports_missing_parameters() {
        let err = SimulationInputBuilder::new().tissue(regions()).build().unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("photon_count"));

        let err = SimulationInputBuilder::new().photon_count(10).build().unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("tissue"));
    }

    #[test]
    fn builder_fills_defaults() {
        let input = SimulationInput::builder()
            .photon_count(100)
            .tissue(regions())
            .detector(DetectorInput::new(DetectorKind::RDiffuse))
            .build()
            .unwrap();
        assert_eq!(input.output_name, "results");
        assert_eq!(input.source, SourceInput::default());
        assert_eq!(input.options, SimulationOptions::default());
        assert_eq!(input.detectors.len(), 1);
    }

    #[test]
    fn options_validation_guards_roulette_and_sizes() {
        assert!(SimulationOptions::default().validate().is_ok());

        let mut options = SimulationOptions::default();
        options.roulette.weight_threshold = 0.5;
        options.roulette.survival_chance = 0.1;
        assert!(matches!(
            options.validate(),
            Err(ConfigError::InvalidOptions(_))
        ));

        let mut options = SimulationOptions::default();
        options.roulette.weight_threshold = 0.0;
        assert!(options.validate().is_ok());

        let options = SimulationOptions {
            batch_size: 0,
            ..Default::default()
        };
        assert!(options.validate().is_err());

        let options = SimulationOptions {
            seed: Some(u64::MAX),
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn absorption_weighting_parses_names_and_abbreviations() {
        assert_eq!(
            "CAW".parse::<AbsorptionWeightingType>().unwrap(),
            AbsorptionWeightingType::Continuous
        );
        assert_eq!(
            "discrete".parse::<AbsorptionWeightingType>().unwrap(),
            AbsorptionWeightingType::Discrete
        );
        assert!("bogus".parse::<AbsorptionWeightingType>().is_err());
        assert_eq!(AbsorptionWeightingType::Analog.to_string(), "analog");
    }
}
