use nalgebra::Vector3;
use std::f64::consts::PI;

const COS_PARALLEL: f64 = 1.0 - 1.0e-12;

/// Samples the polar scattering cosine from the Henyey-Greenstein phase function.
///
/// `xi` must be a uniform deviate in the open interval (0, 1).
pub fn sample_hg_cosine(g: f64, xi: f64) -> f64 {
    if g.abs() < 1.0e-12 {
        return 2.0 * xi - 1.0;
    }
    let tmp = (1.0 - g * g) / (1.0 - g + 2.0 * g * xi);
    ((1.0 + g * g - tmp * tmp) / (2.0 * g)).clamp(-1.0, 1.0)
}

/// Uniformly distributed unit vector on the sphere from two uniform deviates.
pub fn isotropic_direction(xi_cos: f64, xi_phi: f64) -> Vector3<f64> {
    let cos_theta = 2.0 * xi_cos - 1.0;
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * PI * xi_phi;
    Vector3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Rotates `direction` by polar angle `acos(cos_theta)` and azimuth `phi` about itself.
///
/// Uses the local-frame update of Wang and Jacques, falling back to the lab frame when the
/// photon travels (anti)parallel to the z axis. The result is renormalized.
pub fn rotate_direction(direction: &Vector3<f64>, cos_theta: f64, phi: f64) -> Vector3<f64> {
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let (ux, uy, uz) = (direction.x, direction.y, direction.z);

    let rotated = if uz.abs() > COS_PARALLEL {
        Vector3::new(
            sin_theta * cos_phi,
            sin_theta * sin_phi,
            cos_theta * uz.signum(),
        )
    } else {
        let temp = (1.0 - uz * uz).sqrt();
        Vector3::new(
            sin_theta * (ux * uz * cos_phi - uy * sin_phi) / temp + ux * cos_theta,
            sin_theta * (uy * uz * cos_phi + ux * sin_phi) / temp + uy * cos_theta,
            -sin_theta * cos_phi * temp + uz * cos_theta,
        )
    };
    rotated.normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isotropic_hg_is_linear_in_deviate() {
        assert!((sample_hg_cosine(0.0, 0.25) + 0.5).abs() < 1e-12);
        assert!((sample_hg_cosine(0.0, 0.75) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn hg_mean_cosine_matches_anisotropy() {
        let g = 0.9;
        let samples = 200_000;
        let mean: f64 = (0..samples)
            .map(|i| sample_hg_cosine(g, (i as f64 + 0.5) / samples as f64))
            .sum::<f64>()
            / samples as f64;
        assert!((mean - g).abs() < 1e-3, "mean cosine was {mean}");
    }

    #[test]
    fn hg_extremes_are_deterministic_directions() {
        assert!((sample_hg_cosine(1.0, 0.3) - 1.0).abs() < 1e-12);
        assert!((sample_hg_cosine(-1.0, 0.3) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn rotation_preserves_angle_to_original_direction() {
        let dir = Vector3::new(0.3, -0.4, 0.5).normalize();
        let rotated = rotate_direction(&dir, 0.7, 1.1);
        assert!((rotated.norm() - 1.0).abs() < 1e-12);
        assert!((rotated.dot(&dir) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn rotation_along_z_axis_uses_lab_frame() {
        let down = Vector3::new(0.0, 0.0, 1.0);
        let rotated = rotate_direction(&down, 0.5, 0.0);
        assert!((rotated.z - 0.5).abs() < 1e-12);
        let up = Vector3::new(0.0, 0.0, -1.0);
        let rotated = rotate_direction(&up, 0.5, 0.0);
        assert!((rotated.z + 0.5).abs() < 1e-12);

        let back = rotate_direction(&down, -0.5, 0.3);
        assert!((back.z + 0.5).abs() < 1e-12);
        let back = rotate_direction(&up, -0.5, 0.3);
        assert!((back.z - 0.5).abs() < 1e-12);
        assert!((rotate_direction(&down, -1.0, 0.0).z + 1.0).abs() < 1e-12);
    }

    #[test]
    fn isotropic_scatter_from_pencil_beam_has_zero_mean_cosine() {
        let down = Vector3::new(0.0, 0.0, 1.0);
        let n = 400;
        let mut sum = 0.0;
        for i in 0..n {
            let xi = (i as f64 + 0.5) / n as f64;
            let cos_theta = sample_hg_cosine(0.0, xi);
            sum += rotate_direction(&down, cos_theta, 2.0 * PI * xi).z;
        }
        let mean = sum / n as f64;
        assert!(mean.abs() < 1e-9, "mean outgoing uz was {mean}");
    }

    #[test]
    fn isotropic_direction_is_unit_length() {
        for &(a, b) in &[(0.1, 0.2), (0.5, 0.5), (0.99, 0.01)] {
            assert!((isotropic_direction(a, b).norm() - 1.0).abs() < 1e-12);
        }
    }
}
