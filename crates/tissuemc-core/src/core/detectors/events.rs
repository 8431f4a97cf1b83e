use crate::core::tissue::BoundarySide;
use nalgebra::{Point3, Vector3};

/// Something a photon did that detectors may want to count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TallyEvent {
    /// Weight reflected at the entrance surface before the photon ever entered tissue.
    Specular { weight: f64 },
    /// The photon left the tissue into an ambient medium.
    Exit {
        side: BoundarySide,
        position: Point3<f64>,
        direction: Vector3<f64>,
        weight: f64,
    },
    /// Weight deposited at `position` in a region with absorption coefficient `mua`.
    Absorption {
        position: Point3<f64>,
        weight: f64,
        mua: f64,
        region: usize,
    },
}

impl TallyEvent {
    pub fn weight(&self) -> f64 {
        match *self {
            Self::Specular { weight }
            | Self::Exit { weight, .. }
            | Self::Absorption { weight, .. } => weight,
        }
    }
}

/// Receiver of the events produced by one photon history.
pub trait TallySink {
    fn record(&mut self, event: &TallyEvent);
}

impl TallySink for Vec<TallyEvent> {
    fn record(&mut self, event: &TallyEvent) {
        self.push(*event);
    }
}
