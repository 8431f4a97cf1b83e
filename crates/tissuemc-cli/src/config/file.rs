use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::Path;
use tissuemc::core::detectors::{DetectorError, DetectorKind, DoubleRange};
use tissuemc::core::sources::{AngularProfile, SpatialProfile};
use tissuemc::engine::config::AbsorptionWeightingType;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSimulationConfig {
    pub photon_count: Option<u64>,
    pub output_name: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileOptionsConfig {
    pub absorption_weighting: Option<AbsorptionWeightingType>,
    pub seed: Option<u64>,
    pub batch_size: Option<u64>,
    pub max_collisions: Option<u64>,
    pub roulette_threshold: Option<f64>,
    pub roulette_chance: Option<f64>,
}

/// One planar region. `z-min` defaults to the previous region's `z-max` (or -inf for the
/// first region) and `z-max` may only be omitted on the last region.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileRegionConfig {
    pub z_min: Option<f64>,
    pub z_max: Option<f64>,
    pub mua: Option<f64>,
    pub musp: Option<f64>,
    pub g: Option<f64>,
    pub n: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileTissueConfig {
    #[serde(default)]
    pub regions: Vec<FileRegionConfig>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case", rename_all_fields = "kebab-case", tag = "type")]
pub enum FileSpatialProfile {
    Flat { radius: f64 },
    Gaussian { fwhm: f64, cutoff_radius: f64 },
}

impl From<FileSpatialProfile> for SpatialProfile {
    fn from(p: FileSpatialProfile) -> Self {
        match p {
            FileSpatialProfile::Flat { radius } => SpatialProfile::Flat { radius },
            FileSpatialProfile::Gaussian {
                fwhm,
                cutoff_radius,
            } => SpatialProfile::Gaussian {
                fwhm,
                cutoff_radius,
            },
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FileAngularProfile {
    #[default]
    Collimated,
    Lambertian,
}

impl From<FileAngularProfile> for AngularProfile {
    fn from(p: FileAngularProfile) -> Self {
        match p {
            FileAngularProfile::Collimated => AngularProfile::Collimated,
            FileAngularProfile::Lambertian => AngularProfile::Lambertian,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", rename_all_fields = "kebab-case", tag = "type")]
pub enum FileSourceConfig {
    DirectionalPoint {
        position: Option<[f64; 3]>,
        direction: Option<[f64; 3]>,
        initial_region: Option<usize>,
    },
    IsotropicPoint {
        position: [f64; 3],
        initial_region: usize,
    },
    Distributed {
        center: Option<[f64; 3]>,
        spatial: FileSpatialProfile,
        angular: Option<FileAngularProfile>,
        initial_region: Option<usize>,
    },
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileRange {
    pub start: f64,
    pub stop: f64,
    pub number: usize,
}

impl TryFrom<FileRange> for DoubleRange {
    type Error = DetectorError;

    fn try_from(r: FileRange) -> std::result::Result<Self, Self::Error> {
        DoubleRange::new(r.start, r.stop, r.number)
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileDetectorType {
    RDiffuse,
    RSpecular,
    TDiffuse,
    ATotal,
    ROfRho,
    TOfRho,
    FluenceOfRhoAndZ,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileDetectorConfig {
    #[serde(rename = "type")]
    pub kind: FileDetectorType,
    pub name: Option<String>,
    pub tally_second_moment: Option<bool>,
    pub rho: Option<FileRange>,
    pub z: Option<FileRange>,
}

impl FileDetectorConfig {
    /// Resolves the detector type together with the bin ranges it needs.
    pub fn detector_kind(&self) -> Result<DetectorKind> {
        let label = self.name.as_deref().unwrap_or("unnamed");
        let range = |range: Option<FileRange>, axis: &str| -> Result<DoubleRange> {
            let range = range.ok_or_else(|| {
                CliError::Config(format!("Detector '{label}' requires a `{axis}` range."))
            })?;
            DoubleRange::try_from(range)
                .map_err(|e| CliError::Config(format!("Detector '{label}': {e}")))
        };
        let unused = |range: Option<FileRange>, axis: &str| -> Result<()> {
            match range {
                Some(_) => Err(CliError::Config(format!(
                    "Detector '{label}' does not take a `{axis}` range."
                ))),
                None => Ok(()),
            }
        };

        let kind = match self.kind {
            FileDetectorType::RDiffuse => DetectorKind::RDiffuse,
            FileDetectorType::RSpecular => DetectorKind::RSpecular,
            FileDetectorType::TDiffuse => DetectorKind::TDiffuse,
            FileDetectorType::ATotal => DetectorKind::ATotal,
            FileDetectorType::ROfRho => DetectorKind::ROfRho {
                rho: range(self.rho, "rho")?,
            },
            FileDetectorType::TOfRho => DetectorKind::TOfRho {
                rho: range(self.rho, "rho")?,
            },
            FileDetectorType::FluenceOfRhoAndZ => DetectorKind::FluenceOfRhoAndZ {
                rho: range(self.rho, "rho")?,
                z: range(self.z, "z")?,
            },
        };
        if kind.rho().is_none() {
            unused(self.rho, "rho")?;
        }
        if kind.z().is_none() {
            unused(self.z, "z")?;
        }
        Ok(kind)
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub simulation: Option<FileSimulationConfig>,
    pub options: Option<FileOptionsConfig>,
    pub tissue: Option<FileTissueConfig>,
    pub source: Option<FileSourceConfig>,
    #[serde(default)]
    pub detectors: Vec<FileDetectorConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
