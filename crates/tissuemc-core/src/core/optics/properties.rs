use serde::Serialize;
use thiserror::Error;

/// Reduced scattering assigned to ambient media so they remain formally scattering.
pub const AMBIENT_MUSP: f64 = 1e-10;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum OpticalPropertiesError {
    #[error("Absorption coefficient must be finite and non-negative, got {0}")]
    InvalidAbsorption(f64),
    #[error("Reduced scattering coefficient must be finite and non-negative, got {0}")]
    InvalidScattering(f64),
    #[error("Anisotropy must lie in [-1, 1], got {0}")]
    InvalidAnisotropy(f64),
    #[error("Refractive index must be finite and positive, got {0}")]
    InvalidRefractiveIndex(f64),
}

/// Homogeneous bulk optical properties of a tissue region.
///
/// Coefficients are in inverse millimetres. Instances can only be obtained through
/// [`OpticalProperties::new`], so every value in circulation has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OpticalProperties {
    mua: f64,
    musp: f64,
    g: f64,
    n: f64,
}

impl OpticalProperties {
    pub fn new(mua: f64, musp: f64, g: f64, n: f64) -> Result<Self, OpticalPropertiesError> {
        if !mua.is_finite() || mua < 0.0 {
            return Err(OpticalPropertiesError::InvalidAbsorption(mua));
        }
        if !musp.is_finite() || musp < 0.0 {
            return Err(OpticalPropertiesError::InvalidScattering(musp));
        }
        if !(-1.0..=1.0).contains(&g) {
            return Err(OpticalPropertiesError::InvalidAnisotropy(g));
        }
        if !n.is_finite() || n <= 0.0 {
            return Err(OpticalPropertiesError::InvalidRefractiveIndex(n));
        }
        Ok(Self { mua, musp, g, n })
    }

    /// Non-absorbing, forward-scattering medium with refractive index `n` (e.g. air).
    pub fn ambient(n: f64) -> Result<Self, OpticalPropertiesError> {
        Self::new(0.0, AMBIENT_MUSP, 1.0, n)
    }

    #[inline]
    pub fn mua(&self) -> f64 {
        self.mua
    }

    #[inline]
    pub fn musp(&self) -> f64 {
        self.musp
    }

    #[inline]
    pub fn g(&self) -> f64 {
        self.g
    }

    #[inline]
    pub fn n(&self) -> f64 {
        self.n
    }

    /// Scattering coefficient `mus = musp / (1 - g)`; for `g = 1` the reduced value is
    /// returned unchanged.
    #[inline]
    pub fn mus(&self) -> f64 {
        if self.g < 1.0 {
            self.musp / (1.0 - self.g)
        } else {
            self.musp
        }
    }

    /// Total interaction coefficient `mua + mus`.
    #[inline]
    pub fn mut_total(&self) -> f64 {
        self.mua + self.mus()
    }

    /// Probability that an interaction is an absorption, `mua / (mua + mus)`.
    /// Zero when the medium does not interact at all.
    #[inline]
    pub fn absorption_probability(&self) -> f64 {
        let mut_total = self.mut_total();
        if mut_total > 0.0 {
            self.mua / mut_total
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_typical_tissue_values() {
        let op = OpticalProperties::new(0.01, 1.0, 0.8, 1.4).unwrap();
        assert_eq!(op.mua(), 0.01);
        assert_eq!(op.musp(), 1.0);
        assert_eq!(op.g(), 0.8);
        assert_eq!(op.n(), 1.4);
    }

    #[test]
    fn new_rejects_negative_and_non_finite_values() {
        assert_eq!(
            OpticalProperties::new(-0.1, 1.0, 0.0, 1.0),
            Err(OpticalPropertiesError::InvalidAbsorption(-0.1))
        );
        assert!(matches!(
            OpticalProperties::new(0.1, f64::NAN, 0.0, 1.0),
            Err(OpticalPropertiesError::InvalidScattering(_))
        ));
        assert_eq!(
            OpticalProperties::new(0.1, 1.0, 1.5, 1.0),
            Err(OpticalPropertiesError::InvalidAnisotropy(1.5))
        );
        assert_eq!(
            OpticalProperties::new(0.1, 1.0, 0.0, 0.0),
            Err(OpticalPropertiesError::InvalidRefractiveIndex(0.0))
        );
    }

    #[test]
    fn mus_scales_reduced_scattering_by_anisotropy() {
        let op = OpticalProperties::new(0.0, 1.0, 0.8, 1.4).unwrap();
        assert!((op.mus() - 5.0).abs() < 1e-12);

        let isotropic = OpticalProperties::new(0.01, 0.99, 0.0, 1.0).unwrap();
        assert!((isotropic.mut_total() - 1.0).abs() < 1e-12);
        assert!((isotropic.absorption_probability() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn ambient_medium_has_no_absorption() {
        let air = OpticalProperties::ambient(1.0).unwrap();
        assert_eq!(air.mua(), 0.0);
        assert_eq!(air.mus(), AMBIENT_MUSP);
        assert_eq!(air.absorption_probability(), 0.0);
    }

    #[test]
    fn absorption_probability_is_zero_for_void() {
        let void = OpticalProperties::new(0.0, 0.0, 0.0, 1.0).unwrap();
        assert_eq!(void.mut_total(), 0.0);
        assert_eq!(void.absorption_probability(), 0.0);
    }
}
