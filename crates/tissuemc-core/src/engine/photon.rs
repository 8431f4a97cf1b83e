use crate::core::sources::PhotonLaunch;
use nalgebra::{Point3, Vector3};
use serde::Serialize;

/// Where a photon history stands. Every state except `Alive` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PhotonState {
    Alive,
    SpecularReflected,
    ExitedTop,
    ExitedBottom,
    Absorbed,
    KilledByRoulette,
    KilledOverMaxCollisions,
    Degenerate,
}

impl PhotonState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        self != Self::Alive
    }

    /// Whether the history's tallies should be kept.
    #[inline]
    pub fn is_committed(self) -> bool {
        self != Self::Degenerate
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Photon {
    pub position: Point3<f64>,
    pub direction: Vector3<f64>,
    pub weight: f64,
    pub region: usize,
    /// Dimensionless optical depth left before the next interaction.
    pub step_remaining: f64,
    /// Scattering events plus boundary reflections so far.
    pub collisions: u64,
    pub path_length: f64,
    pub state: PhotonState,
}

impl Photon {
    pub fn launched(launch: PhotonLaunch) -> Self {
        Self {
            position: launch.position,
            direction: launch.direction,
            weight: 1.0,
            region: launch.region,
            step_remaining: 0.0,
            collisions: 0,
            path_length: 0.0,
            state: PhotonState::Alive,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.state == PhotonState::Alive
    }

    /// Finite position and direction with a weight in (0, 1].
    pub fn is_sane(&self) -> bool {
        self.position.iter().all(|c| c.is_finite())
            && self.direction.iter().all(|c| c.is_finite())
            && self.weight > 0.0
            && self.weight <= 1.0 + 1e-12
    }

    #[inline]
    pub fn advance(&mut self, distance: f64) {
        self.position += self.direction * distance;
        self.path_length += distance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launch() -> PhotonLaunch {
        PhotonLaunch {
            position: Point3::origin(),
            direction: Vector3::z(),
            region: 1,
        }
    }

    #[test]
    fn launched_photon_carries_unit_weight() {
        let photon = Photon::launched(launch());
        assert_eq!(photon.weight, 1.0);
        assert!(photon.is_alive());
        assert!(photon.is_sane());
    }

    #[test]
    fn advance_moves_along_direction_and_accumulates_path() {
        let mut photon = Photon::launched(launch());
        photon.advance(2.5);
        photon.advance(0.5);
        assert_eq!(photon.position, Point3::new(0.0, 0.0, 3.0));
        assert!((photon.path_length - 3.0).abs() < 1e-15);
    }

    #[test]
    fn sanity_rejects_nan_and_zero_weight() {
        let mut photon = Photon::launched(launch());
        photon.direction.x = f64::NAN;
        assert!(!photon.is_sane());

        let mut photon = Photon::launched(launch());
        photon.weight = 0.0;
        assert!(!photon.is_sane());
        assert!(PhotonState::Degenerate.is_terminal());
        assert!(!PhotonState::Degenerate.is_committed());
        assert!(PhotonState::KilledByRoulette.is_committed());
    }
}
