use crate::core::optics::properties::OpticalProperties;
use serde::Serialize;

/// Closed-open interval of depth `[start, stop)` in millimetres; either end may be infinite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZRange {
    pub start: f64,
    pub stop: f64,
}

impl ZRange {
    pub fn new(start: f64, stop: f64) -> Self {
        Self { start, stop }
    }

    #[inline]
    pub fn contains(&self, z: f64) -> bool {
        z >= self.start && z < self.stop
    }

    #[inline]
    pub fn thickness(&self) -> f64 {
        self.stop - self.start
    }
}

/// A slab of homogeneous tissue bounded by two planes of constant z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TissueRegion {
    pub z_range: ZRange,
    pub optical_properties: OpticalProperties,
}

impl TissueRegion {
    pub fn new(z_range: ZRange, optical_properties: OpticalProperties) -> Self {
        Self {
            z_range,
            optical_properties,
        }
    }

    /// Convenience constructor for a layer spanning `[z_start, z_stop)`.
    pub fn layer(z_start: f64, z_stop: f64, optical_properties: OpticalProperties) -> Self {
        Self::new(ZRange::new(z_start, z_stop), optical_properties)
    }
}
