use super::photon::PhotonState;
use serde::Serialize;

/// Counts of photon histories by how they ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    pub launched: u64,
    pub specular_reflected: u64,
    pub exited_top: u64,
    pub exited_bottom: u64,
    pub absorbed: u64,
    pub killed_by_roulette: u64,
    pub killed_over_max_collisions: u64,
    /// Histories discarded because the photon state became non-finite or weightless.
    pub degenerate: u64,
    pub collisions: u64,
}

impl RunStatistics {
    pub fn record(&mut self, state: PhotonState, collisions: u64) {
        self.launched += 1;
        self.collisions += collisions;
        match state {
            PhotonState::Alive => {}
            PhotonState::SpecularReflected => self.specular_reflected += 1,
            PhotonState::ExitedTop => self.exited_top += 1,
            PhotonState::ExitedBottom => self.exited_bottom += 1,
            PhotonState::Absorbed => self.absorbed += 1,
            PhotonState::KilledByRoulette => self.killed_by_roulette += 1,
            PhotonState::KilledOverMaxCollisions => self.killed_over_max_collisions += 1,
            PhotonState::Degenerate => self.degenerate += 1,
        }
    }

    pub fn merge(&mut self, other: &RunStatistics) {
        self.launched += other.launched;
        self.specular_reflected += other.specular_reflected;
        self.exited_top += other.exited_top;
        self.exited_bottom += other.exited_bottom;
        self.absorbed += other.absorbed;
        self.killed_by_roulette += other.killed_by_roulette;
        self.killed_over_max_collisions += other.killed_over_max_collisions;
        self.degenerate += other.degenerate;
        self.collisions += other.collisions;
    }

    /// Histories whose tallies were kept.
    pub fn committed(&self) -> u64 {
        self.launched - self.degenerate
    }
}
