use crate::core::tissue::LayeredTissue;
use nalgebra::{Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    #[error("Initial region {index} does not exist in a tissue with {count} regions")]
    RegionOutOfRange { index: usize, count: usize },

    #[error("Source position must be finite, got ({x}, {y}, {z})")]
    NonFinitePosition { x: f64, y: f64, z: f64 },

    #[error("Source position z = {z} lies outside initial region {region}")]
    PositionOutsideRegion { z: f64, region: usize },

    #[error("Source direction must be a finite, non-zero vector")]
    InvalidDirection,

    #[error("Source in ambient region {region} must point toward the tissue")]
    FacingAwayFromTissue { region: usize },

    #[error("An isotropic point source must start inside a tissue layer, not ambient region {0}")]
    IsotropicInAmbient(usize),

    #[error("Invalid beam profile: {0}")]
    InvalidProfile(String),
}

/// Spatial distribution of an area source over the plane `z = center.z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpatialProfile {
    /// Uniform over a disk of the given radius.
    Flat { radius: f64 },
    /// Radially Gaussian with the given full width at half maximum, truncated at
    /// `cutoff_radius`.
    Gaussian { fwhm: f64, cutoff_radius: f64 },
}

/// Angular distribution of an area source; both emit into +z.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngularProfile {
    Collimated,
    Lambertian,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceInput {
    IsotropicPoint {
        position: Point3<f64>,
        initial_region: usize,
    },
    DirectionalPoint {
        position: Point3<f64>,
        direction: Vector3<f64>,
        initial_region: usize,
    },
    Distributed {
        center: Point3<f64>,
        spatial: SpatialProfile,
        angular: AngularProfile,
        initial_region: usize,
    },
}

impl Default for SourceInput {
    /// A normally incident pencil beam entering the tissue from the top ambient medium.
    fn default() -> Self {
        Self::DirectionalPoint {
            position: Point3::origin(),
            direction: Vector3::z(),
            initial_region: 0,
        }
    }
}

impl SourceInput {
    pub fn initial_region(&self) -> usize {
        match self {
            Self::IsotropicPoint { initial_region, .. }
            | Self::DirectionalPoint { initial_region, .. }
            | Self::Distributed { initial_region, .. } => *initial_region,
        }
    }

    fn origin(&self) -> Point3<f64> {
        match self {
            Self::IsotropicPoint { position, .. } | Self::DirectionalPoint { position, .. } => {
                *position
            }
            Self::Distributed { center, .. } => *center,
        }
    }

    /// Checks the source against `tissue` and returns a copy with a normalized direction.
    pub fn validated(self, tissue: &LayeredTissue) -> Result<Self, SourceError> {
        let region = self.initial_region();
        let count = tissue.region_count();
        let Some(owner) = tissue.region(region) else {
            return Err(SourceError::RegionOutOfRange {
                index: region,
                count,
            });
        };

        let origin = self.origin();
        if !(origin.x.is_finite() && origin.y.is_finite() && origin.z.is_finite()) {
            return Err(SourceError::NonFinitePosition {
                x: origin.x,
                y: origin.y,
                z: origin.z,
            });
        }
        if origin.z < owner.z_range.start || origin.z > owner.z_range.stop {
            return Err(SourceError::PositionOutsideRegion {
                z: origin.z,
                region,
            });
        }

        let validated = match self {
            Self::IsotropicPoint { .. } => {
                if tissue.is_ambient(region) {
                    return Err(SourceError::IsotropicInAmbient(region));
                }
                self
            }
            Self::DirectionalPoint {
                position,
                direction,
                initial_region,
            } => {
                let norm = direction.norm();
                if !norm.is_finite() || norm == 0.0 {
                    return Err(SourceError::InvalidDirection);
                }
                let direction = direction / norm;
                check_facing(tissue, region, direction.z)?;
                Self::DirectionalPoint {
                    position,
                    direction,
                    initial_region,
                }
            }
            Self::Distributed { spatial, .. } => {
                validate_profile(&spatial)?;
                check_facing(tissue, region, 1.0)?;
                self
            }
        };
        Ok(validated)
    }
}

fn check_facing(tissue: &LayeredTissue, region: usize, uz: f64) -> Result<(), SourceError> {
    let facing_away = (region == 0 && uz <= 0.0)
        || (region == tissue.region_count() - 1 && uz >= 0.0);
    if facing_away {
        Err(SourceError::FacingAwayFromTissue { region })
    } else {
        Ok(())
    }
}

fn validate_profile(profile: &SpatialProfile) -> Result<(), SourceError> {
    match *profile {
        SpatialProfile::Flat { radius } => {
            if !radius.is_finite() || radius < 0.0 {
                return Err(SourceError::InvalidProfile(format!(
                    "flat radius must be finite and non-negative, got {radius}"
                )));
            }
        }
        SpatialProfile::Gaussian { fwhm, cutoff_radius } => {
            if !fwhm.is_finite() || fwhm <= 0.0 {
                return Err(SourceError::InvalidProfile(format!(
                    "gaussian FWHM must be finite and positive, got {fwhm}"
                )));
            }
            if !cutoff_radius.is_finite() || cutoff_radius <= 0.0 {
                return Err(SourceError::InvalidProfile(format!(
                    "gaussian cutoff radius must be finite and positive, got {cutoff_radius}"
                )));
            }
        }
    }
    Ok(())
}
