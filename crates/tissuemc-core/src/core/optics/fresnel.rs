use nalgebra::Vector3;

const COS_NORMAL: f64 = 1.0 - 1.0e-12;
const COS_GRAZING: f64 = 1.0e-6;

/// Unpolarized Fresnel reflectance for light crossing from index `n1` into `n2`.
///
/// `cos_i` is the cosine of the incidence angle measured from the interface normal; its
/// sign is ignored. Total internal reflection and grazing incidence return `1.0`.
pub fn reflectance(n1: f64, n2: f64, cos_i: f64) -> f64 {
    if n1 == n2 {
        return 0.0;
    }
    let cos_i = cos_i.abs().min(1.0);
    if cos_i > COS_NORMAL {
        let r = (n1 - n2) / (n1 + n2);
        return r * r;
    }
    if cos_i < COS_GRAZING {
        return 1.0;
    }

    let sin_i = (1.0 - cos_i * cos_i).sqrt();
    let sin_t = n1 / n2 * sin_i;
    if sin_t >= 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin_t * sin_t).sqrt();

    let rs = (n1 * cos_i - n2 * cos_t) / (n1 * cos_i + n2 * cos_t);
    let rp = (n1 * cos_t - n2 * cos_i) / (n1 * cos_t + n2 * cos_i);
    0.5 * (rs * rs + rp * rp)
}

/// Cosine of the transmission angle, or `None` under total internal reflection.
pub fn transmitted_cosine(n1: f64, n2: f64, cos_i: f64) -> Option<f64> {
    let cos_i = cos_i.abs().min(1.0);
    let sin_i = (1.0 - cos_i * cos_i).max(0.0).sqrt();
    let sin_t = n1 / n2 * sin_i;
    if sin_t > 1.0 {
        None
    } else {
        Some((1.0 - sin_t * sin_t).max(0.0).sqrt())
    }
}

/// Refracts `direction` through a plane of constant z, keeping the sign of `uz`.
pub fn refract(direction: &Vector3<f64>, n1: f64, n2: f64) -> Option<Vector3<f64>> {
    if n1 == n2 {
        return Some(*direction);
    }
    let cos_t = transmitted_cosine(n1, n2, direction.z)?;
    let ratio = n1 / n2;
    Some(Vector3::new(
        direction.x * ratio,
        direction.y * ratio,
        cos_t.copysign(direction.z),
    ))
}

/// Mirrors `direction` about a plane of constant z.
#[inline]
pub fn reflect(direction: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(direction.x, direction.y, -direction.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_incidence_matches_closed_form() {
        let r = reflectance(1.0, 1.4, 1.0);
        let expected = ((1.0_f64 - 1.4) / (1.0 + 1.4)).powi(2);
        assert!((r - expected).abs() < 1e-15);
        assert!((reflectance(1.4, 1.0, -1.0) - expected).abs() < 1e-15);
    }

    #[test]
    fn matched_indices_never_reflect() {
        assert_eq!(reflectance(1.33, 1.33, 0.3), 0.0);
        assert_eq!(reflectance(1.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn total_internal_reflection_beyond_critical_angle() {
        let critical_sin = 1.0 / 1.4;
        let cos_beyond = (1.0 - (critical_sin + 0.05_f64).powi(2)).sqrt();
        assert_eq!(reflectance(1.4, 1.0, cos_beyond), 1.0);
        assert!(transmitted_cosine(1.4, 1.0, cos_beyond).is_none());
    }

    #[test]
    fn oblique_reflectance_is_between_normal_value_and_one() {
        let normal = reflectance(1.0, 1.5, 1.0);
        let oblique = reflectance(1.0, 1.5, 0.5);
        assert!(oblique > normal);
        assert!(oblique < 1.0);
    }

    #[test]
    fn refraction_preserves_unit_length_and_follows_snell() {
        let dir = Vector3::new(0.6, 0.0, 0.8);
        let refracted = refract(&dir, 1.0, 1.4).unwrap();
        assert!((refracted.norm() - 1.0).abs() < 1e-12);
        assert!(refracted.z > 0.0);
        let sin_i = 0.6;
        let sin_t = (refracted.x * refracted.x + refracted.y * refracted.y).sqrt();
        assert!((1.0 * sin_i - 1.4 * sin_t).abs() < 1e-12);
    }

    #[test]
    fn refraction_keeps_travel_direction_sign() {
        let dir = Vector3::new(0.0, 0.6, -0.8);
        let refracted = refract(&dir, 1.4, 1.33).unwrap();
        assert!(refracted.z < 0.0);
    }

    #[test]
    fn reflect_flips_only_z() {
        let dir = Vector3::new(0.1, 0.2, 0.3);
        assert_eq!(reflect(&dir), Vector3::new(0.1, 0.2, -0.3));
    }
}
