use super::region::TissueRegion;
use crate::core::optics::properties::OpticalProperties;
use nalgebra::{Point3, Vector3};
use serde::Serialize;
use std::ops::Range;
use thiserror::Error;

const MIN_REGION_COUNT: usize = 3;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TissueError {
    #[error(
        "Tissue requires at least {minimum} regions (an ambient medium on each side of one layer), got {found}"
    )]
    TooFewRegions { found: usize, minimum: usize },

    #[error("The first region must extend to negative infinity, but it starts at {0}")]
    TopNotUnbounded(f64),

    #[error("The last region must extend to positive infinity, but it stops at {0}")]
    BottomNotUnbounded(f64),

    #[error("Regions {upper} and {lower} do not meet: region {upper} stops at {stop}, region {lower} starts at {start}")]
    Discontinuous {
        upper: usize,
        lower: usize,
        stop: f64,
        start: f64,
    },

    #[error("Tissue layer {index} must have a finite, positive thickness, got [{start}, {stop})")]
    InvalidLayer { index: usize, start: f64, stop: f64 },

    #[error("Depth {0} does not belong to any tissue region")]
    OutOfBounds(f64),
}

/// The ambient surface a photon leaves the tissue through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BoundarySide {
    Top,
    Bottom,
}

/// An ordered stack of regions partitioning the z axis, validated at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct LayeredTissue {
    regions: Vec<TissueRegion>,
}

impl LayeredTissue {
    pub fn new(regions: Vec<TissueRegion>) -> Result<Self, TissueError> {
        if regions.len() < MIN_REGION_COUNT {
            return Err(TissueError::TooFewRegions {
                found: regions.len(),
                minimum: MIN_REGION_COUNT,
            });
        }

        let first = regions[0].z_range;
        if first.start != f64::NEG_INFINITY {
            return Err(TissueError::TopNotUnbounded(first.start));
        }
        let last = regions[regions.len() - 1].z_range;
        if last.stop != f64::INFINITY {
            return Err(TissueError::BottomNotUnbounded(last.stop));
        }

        for (upper, pair) in regions.windows(2).enumerate() {
            let (stop, start) = (pair[0].z_range.stop, pair[1].z_range.start);
            if stop != start {
                return Err(TissueError::Discontinuous {
                    upper,
                    lower: upper + 1,
                    stop,
                    start,
                });
            }
        }

        for (index, region) in regions
            .iter()
            .enumerate()
            .take(regions.len() - 1)
            .skip(1)
        {
            let range = region.z_range;
            if !range.start.is_finite() || !range.stop.is_finite() || range.thickness() <= 0.0 {
                return Err(TissueError::InvalidLayer {
                    index,
                    start: range.start,
                    stop: range.stop,
                });
            }
        }

        Ok(Self { regions })
    }

    pub fn regions(&self) -> &[TissueRegion] {
        &self.regions
    }

    #[inline]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn region(&self, index: usize) -> Option<&TissueRegion> {
        self.regions.get(index)
    }

    /// Optical properties of region `index`. Panics if the index is out of range; indices
    /// handed out by this tissue are always valid.
    #[inline]
    pub fn optical_properties(&self, index: usize) -> &OpticalProperties {
        &self.regions[index].optical_properties
    }

    /// Index of the region owning depth `z` under the closed-open convention.
    pub fn region_index(&self, z: f64) -> Result<usize, TissueError> {
        if z.is_nan() {
            return Err(TissueError::OutOfBounds(z));
        }
        self.regions
            .iter()
            .position(|region| region.z_range.contains(z))
            .ok_or(TissueError::OutOfBounds(z))
    }

    #[inline]
    pub fn is_ambient(&self, index: usize) -> bool {
        index == 0 || index == self.regions.len() - 1
    }

    /// Indices of the interior (non-ambient) layers.
    pub fn layer_indices(&self) -> Range<usize> {
        1..self.regions.len() - 1
    }

    /// Depths of every internal boundary plane, top to bottom.
    pub fn boundaries(&self) -> Vec<f64> {
        self.regions[..self.regions.len() - 1]
            .iter()
            .map(|region| region.z_range.stop)
            .collect()
    }

    /// Depth of the plane separating the top ambient medium from the first layer.
    pub fn top_surface(&self) -> f64 {
        self.regions[0].z_range.stop
    }

    /// Depth of the plane separating the last layer from the bottom ambient medium.
    pub fn bottom_surface(&self) -> f64 {
        self.regions[self.regions.len() - 1].z_range.start
    }

    /// Which surface a photon crosses when it enters ambient region `index`.
    pub fn exit_side(&self, index: usize) -> Option<BoundarySide> {
        if index == 0 {
            Some(BoundarySide::Top)
        } else if index == self.regions.len() - 1 {
            Some(BoundarySide::Bottom)
        } else {
            None
        }
    }

    /// The boundary plane ahead of a photon in region `index` travelling with z-cosine
    /// `uz`, together with the region on the other side. `None` when `uz` is zero or the
    /// photon is heading out of an unbounded ambient region.
    pub fn boundary_ahead(&self, index: usize, uz: f64) -> Option<(f64, usize)> {
        let range = self.regions[index].z_range;
        if uz > 0.0 && index + 1 < self.regions.len() {
            Some((range.stop, index + 1))
        } else if uz < 0.0 && index > 0 {
            Some((range.start, index - 1))
        } else {
            None
        }
    }

    /// Geometric distance along `direction` to the next boundary of region `index`;
    /// infinite when the photon never reaches one.
    pub fn distance_to_boundary(
        &self,
        index: usize,
        position: &Point3<f64>,
        direction: &Vector3<f64>,
    ) -> f64 {
        match self.boundary_ahead(index, direction.z) {
            Some((plane, _)) => ((plane - position.z) / direction.z).max(0.0),
            None => f64::INFINITY,
        }
    }
}
