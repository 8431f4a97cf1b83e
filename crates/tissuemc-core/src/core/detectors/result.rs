use super::input::DetectorKind;
use serde::Serialize;

/// Normalized estimates produced by one detector at the end of a run.
///
/// Multi-dimensional detectors are flattened with rho as the outer axis, so bin `(ir, iz)`
/// lives at `ir * shape[1] + iz`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectorResult {
    pub name: String,
    pub kind: DetectorKind,
    pub shape: Vec<usize>,
    pub mean: Vec<f64>,
    pub second_moment: Option<Vec<f64>>,
    pub std_dev: Option<Vec<f64>>,
    pub rho_edges: Option<Vec<f64>>,
    pub z_edges: Option<Vec<f64>>,
}

impl DetectorResult {
    /// The single value of a scalar detector.
    pub fn scalar(&self) -> Option<f64> {
        self.kind.is_scalar().then(|| self.mean[0])
    }

    pub fn scalar_std_dev(&self) -> Option<f64> {
        if !self.kind.is_scalar() {
            return None;
        }
        self.std_dev.as_ref().map(|sd| sd[0])
    }

    /// Mean of bin `(ir, iz)` of a two-dimensional detector.
    pub fn mean_at(&self, ir: usize, iz: usize) -> Option<f64> {
        match self.shape.as_slice() {
            [nr, nz] if ir < *nr && iz < *nz => Some(self.mean[ir * nz + iz]),
            _ => None,
        }
    }
}
