use super::input::{AngularProfile, SourceInput, SpatialProfile};
use crate::core::optics::scattering::isotropic_direction;
use nalgebra::{Point3, Vector3};
use rand::Rng;
use rand::distributions::Open01;
use std::f64::consts::PI;

/// Initial state of a photon as emitted by a source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotonLaunch {
    pub position: Point3<f64>,
    pub direction: Vector3<f64>,
    pub region: usize,
}

impl SourceInput {
    /// Draws a launch state. The source must have been validated.
    pub fn launch<R: Rng + ?Sized>(&self, rng: &mut R) -> PhotonLaunch {
        match self {
            Self::IsotropicPoint {
                position,
                initial_region,
            } => PhotonLaunch {
                position: *position,
                direction: isotropic_direction(rng.sample(Open01), rng.sample(Open01)),
                region: *initial_region,
            },
            Self::DirectionalPoint {
                position,
                direction,
                initial_region,
            } => PhotonLaunch {
                position: *position,
                direction: *direction,
                region: *initial_region,
            },
            Self::Distributed {
                center,
                spatial,
                angular,
                initial_region,
            } => {
                let radius = sample_radius(spatial, rng.sample(Open01));
                let phi = 2.0 * PI * rng.sample::<f64, _>(Open01);
                let position = Point3::new(
                    center.x + radius * phi.cos(),
                    center.y + radius * phi.sin(),
                    center.z,
                );
                PhotonLaunch {
                    position,
                    direction: sample_angular(angular, rng),
                    region: *initial_region,
                }
            }
        }
    }
}

fn sample_radius(profile: &SpatialProfile, xi: f64) -> f64 {
    match *profile {
        SpatialProfile::Flat { radius } => radius * xi.sqrt(),
        SpatialProfile::Gaussian { fwhm, cutoff_radius } => {
            // Inverse CDF of a Rayleigh distribution truncated at the cutoff.
            let sigma = fwhm / (2.0 * (2.0 * 2.0_f64.ln()).sqrt());
            let two_sigma_sq = 2.0 * sigma * sigma;
            let tail = 1.0 - (-cutoff_radius * cutoff_radius / two_sigma_sq).exp();
            (-two_sigma_sq * (1.0 - xi * tail).ln()).sqrt()
        }
    }
}

fn sample_angular<R: Rng + ?Sized>(profile: &AngularProfile, rng: &mut R) -> Vector3<f64> {
    match profile {
        AngularProfile::Collimated => Vector3::z(),
        AngularProfile::Lambertian => {
            let cos_theta = rng.sample::<f64, _>(Open01).sqrt();
            let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
            let phi = 2.0 * PI * rng.sample::<f64, _>(Open01);
            Vector3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
        }
    }
}
