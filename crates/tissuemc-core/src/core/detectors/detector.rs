use super::events::TallyEvent;
use super::input::{DetectorError, DetectorInput, DetectorKind};
use super::range::DoubleRange;
use super::result::DetectorResult;
use crate::core::tissue::BoundarySide;
use std::f64::consts::PI;

/// Running accumulator for one detector.
///
/// Values contributed by the history in flight are buffered in `history` and only reach
/// `sum` (and `sum_sq`) when the history is committed, so a bin hit several times by one
/// photon contributes the square of its total to the second moment.
#[derive(Debug, Clone)]
pub struct Detector {
    input: DetectorInput,
    sum: Vec<f64>,
    sum_sq: Option<Vec<f64>>,
    history: Vec<f64>,
    touched: Vec<usize>,
}

impl Detector {
    pub fn new(input: DetectorInput) -> Result<Self, DetectorError> {
        input.validate()?;
        let bins = input.kind.bin_count();
        Ok(Self {
            sum: vec![0.0; bins],
            sum_sq: input.tally_second_moment.then(|| vec![0.0; bins]),
            history: vec![0.0; bins],
            touched: Vec::new(),
            input,
        })
    }

    /// A detector with this configuration and nothing accumulated.
    pub fn empty_like(&self) -> Self {
        let bins = self.sum.len();
        Self {
            input: self.input.clone(),
            sum: vec![0.0; bins],
            sum_sq: self.sum_sq.as_ref().map(|_| vec![0.0; bins]),
            history: vec![0.0; bins],
            touched: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.input.name
    }

    #[inline]
    pub fn input(&self) -> &DetectorInput {
        &self.input
    }

    #[inline]
    pub fn bin_count(&self) -> usize {
        self.sum.len()
    }

    /// Accumulated (unnormalized) weight per bin over all committed histories.
    pub fn sum(&self) -> &[f64] {
        &self.sum
    }

    pub fn sum_sq(&self) -> Option<&[f64]> {
        self.sum_sq.as_deref()
    }

    /// Routes an event into the current history buffer if this detector accepts it.
    pub fn tally(&mut self, event: &TallyEvent) {
        if let Some((bin, value)) = self.bin_contribution(event) {
            if value == 0.0 {
                return;
            }
            if self.history[bin] == 0.0 {
                self.touched.push(bin);
            }
            self.history[bin] += value;
        }
    }

    pub fn end_history(&mut self) {
        for &bin in &self.touched {
            let value = self.history[bin];
            self.sum[bin] += value;
            if let Some(sum_sq) = self.sum_sq.as_mut() {
                sum_sq[bin] += value * value;
            }
            self.history[bin] = 0.0;
        }
        self.touched.clear();
    }

    pub fn abandon_history(&mut self) {
        for &bin in &self.touched {
            self.history[bin] = 0.0;
        }
        self.touched.clear();
    }

    pub fn merge(&mut self, other: &Detector) -> Result<(), DetectorError> {
        if self.input != other.input {
            return Err(DetectorError::MergeMismatch {
                name: self.input.name.clone(),
                other: other.input.name.clone(),
            });
        }
        for (a, b) in self.sum.iter_mut().zip(&other.sum) {
            *a += b;
        }
        if let (Some(a), Some(b)) = (self.sum_sq.as_mut(), other.sum_sq.as_ref()) {
            for (x, y) in a.iter_mut().zip(b) {
                *x += y;
            }
        }
        Ok(())
    }

    /// Normalizes the accumulators by `photon_count` launched histories and the bin
    /// geometry.
    pub fn finalize(&self, photon_count: u64) -> DetectorResult {
        let n = photon_count.max(1) as f64;
        let norms = bin_normalizations(&self.input.kind);

        let mean: Vec<f64> = self
            .sum
            .iter()
            .zip(&norms)
            .map(|(s, norm)| s / (n * norm))
            .collect();

        let second_moment: Option<Vec<f64>> = self.sum_sq.as_ref().map(|sum_sq| {
            sum_sq
                .iter()
                .zip(&norms)
                .map(|(s, norm)| s / (n * norm * norm))
                .collect()
        });

        let std_dev = second_moment.as_ref().map(|sm| {
            sm.iter()
                .zip(&mean)
                .map(|(sm, m)| ((sm - m * m).max(0.0) / n).sqrt())
                .collect()
        });

        DetectorResult {
            name: self.input.name.clone(),
            kind: self.input.kind,
            shape: self.input.kind.shape(),
            rho_edges: self.input.kind.rho().map(DoubleRange::edges),
            z_edges: self.input.kind.z().map(DoubleRange::edges),
            mean,
            second_moment,
            std_dev,
        }
    }

    fn bin_contribution(&self, event: &TallyEvent) -> Option<(usize, f64)> {
        match (&self.input.kind, event) {
            (DetectorKind::RSpecular, TallyEvent::Specular { weight }) => Some((0, *weight)),
            (DetectorKind::ATotal, TallyEvent::Absorption { weight, .. }) => Some((0, *weight)),
            (
                DetectorKind::RDiffuse,
                TallyEvent::Exit {
                    side: BoundarySide::Top,
                    weight,
                    ..
                },
            )
            | (
                DetectorKind::TDiffuse,
                TallyEvent::Exit {
                    side: BoundarySide::Bottom,
                    weight,
                    ..
                },
            ) => Some((0, *weight)),
            (
                DetectorKind::ROfRho { rho },
                TallyEvent::Exit {
                    side: BoundarySide::Top,
                    position,
                    weight,
                    ..
                },
            )
            | (
                DetectorKind::TOfRho { rho },
                TallyEvent::Exit {
                    side: BoundarySide::Bottom,
                    position,
                    weight,
                    ..
                },
            ) => {
                let r = position.x.hypot(position.y);
                rho.bin_index(r).map(|bin| (bin, *weight))
            }
            (
                DetectorKind::FluenceOfRhoAndZ { rho, z },
                TallyEvent::Absorption {
                    position,
                    weight,
                    mua,
                    ..
                },
            ) => {
                if *mua <= 0.0 {
                    return None;
                }
                let ir = rho.bin_index(position.x.hypot(position.y))?;
                let iz = z.bin_index(position.z)?;
                Some((ir * z.bin_count() + iz, weight / mua))
            }
            _ => None,
        }
    }
}

fn annulus_areas(rho: &DoubleRange) -> Vec<f64> {
    rho.edges()
        .windows(2)
        .map(|pair| PI * (pair[1] * pair[1] - pair[0] * pair[0]))
        .collect()
}

fn bin_normalizations(kind: &DetectorKind) -> Vec<f64> {
    match kind {
        DetectorKind::RDiffuse
        | DetectorKind::RSpecular
        | DetectorKind::TDiffuse
        | DetectorKind::ATotal => vec![1.0],
        DetectorKind::ROfRho { rho } | DetectorKind::TOfRho { rho } => annulus_areas(rho),
        DetectorKind::FluenceOfRhoAndZ { rho, z } => {
            let dz = z.delta();
            annulus_areas(rho)
                .into_iter()
                .flat_map(|area| std::iter::repeat_n(area * dz, z.bin_count()))
                .collect()
        }
    }
}
