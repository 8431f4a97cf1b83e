//! Planar layered tissue geometry.
//!
//! A tissue is an ordered stack of [`region::TissueRegion`]s that partitions the whole z
//! axis. The first and last regions are unbounded and act as the ambient media photons
//! escape into; everything in between is tissue in which transport is simulated.

pub mod layered;
pub mod region;

pub use layered::{BoundarySide, LayeredTissue, TissueError};
pub use region::{TissueRegion, ZRange};
