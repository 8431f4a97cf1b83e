use super::range::DoubleRange;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectorError {
    #[error("Invalid bin range: start = {start}, stop = {stop}, number of edges = {number}")]
    InvalidRange { start: f64, stop: f64, number: usize },

    #[error("Detector '{name}' bins radial distance and cannot start below zero (got {start})")]
    NegativeRadius { name: String, start: f64 },

    #[error("Detector name cannot be empty")]
    EmptyName,

    #[error("Detector name '{0}' is not a valid file name")]
    InvalidName(String),

    #[error("Detector name '{0}' is used more than once")]
    DuplicateName(String),

    #[error("Cannot merge detector '{other}' into detector '{name}': configurations differ")]
    MergeMismatch { name: String, other: String },
}

/// The quantity a detector accumulates and the bins it uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DetectorKind {
    RDiffuse,
    RSpecular,
    TDiffuse,
    ATotal,
    ROfRho { rho: DoubleRange },
    TOfRho { rho: DoubleRange },
    FluenceOfRhoAndZ { rho: DoubleRange, z: DoubleRange },
}

impl DetectorKind {
    pub fn default_name(&self) -> &'static str {
        match self {
            Self::RDiffuse => "RDiffuse",
            Self::RSpecular => "RSpecular",
            Self::TDiffuse => "TDiffuse",
            Self::ATotal => "ATotal",
            Self::ROfRho { .. } => "ROfRho",
            Self::TOfRho { .. } => "TOfRho",
            Self::FluenceOfRhoAndZ { .. } => "FluenceOfRhoAndZ",
        }
    }

    /// Bin counts along each axis; scalar detectors have shape `[1]`.
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Self::RDiffuse | Self::RSpecular | Self::TDiffuse | Self::ATotal => vec![1],
            Self::ROfRho { rho } | Self::TOfRho { rho } => vec![rho.bin_count()],
            Self::FluenceOfRhoAndZ { rho, z } => vec![rho.bin_count(), z.bin_count()],
        }
    }

    pub fn bin_count(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::RDiffuse | Self::RSpecular | Self::TDiffuse | Self::ATotal
        )
    }

    pub fn rho(&self) -> Option<&DoubleRange> {
        match self {
            Self::ROfRho { rho } | Self::TOfRho { rho } | Self::FluenceOfRhoAndZ { rho, .. } => {
                Some(rho)
            }
            _ => None,
        }
    }

    pub fn z(&self) -> Option<&DoubleRange> {
        match self {
            Self::FluenceOfRhoAndZ { z, .. } => Some(z),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectorInput {
    pub name: String,
    pub kind: DetectorKind,
    pub tally_second_moment: bool,
}

impl DetectorInput {
    /// A detector named after its kind, without second-moment tracking.
    pub fn new(kind: DetectorKind) -> Self {
        Self {
            name: kind.default_name().to_string(),
            kind,
            tally_second_moment: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_second_moment(mut self, enabled: bool) -> Self {
        self.tally_second_moment = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), DetectorError> {
        if self.name.trim().is_empty() {
            return Err(DetectorError::EmptyName);
        }
        if !is_file_stem(&self.name) {
            return Err(DetectorError::InvalidName(self.name.clone()));
        }
        if let Some(rho) = self.kind.rho() {
            if rho.start() < 0.0 {
                return Err(DetectorError::NegativeRadius {
                    name: self.name.clone(),
                    start: rho.start(),
                });
            }
        }
        Ok(())
    }
}

// Names become `<name>.csv` inside the output directory.
fn is_file_stem(name: &str) -> bool {
    const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
    name != "."
        && name != ".."
        && !name.contains("..")
        && name.trim() == name
        && !name.chars().any(|c| c.is_control() || RESERVED.contains(&c))
}
