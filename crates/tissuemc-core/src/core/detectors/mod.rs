//! # Detectors Module
//!
//! Statistical tallies fed by photon transport events.
//!
//! ## Overview
//!
//! Every detector variant shares one contract and differs only in the events it accepts and
//! the geometry of its bins:
//!
//! | Kind                | Accepts                 | Bins                     | Normalization          |
//! |---------------------|-------------------------|--------------------------|------------------------|
//! | `RDiffuse`          | exits through the top   | scalar                   | 1                      |
//! | `RSpecular`         | specular reflection     | scalar                   | 1                      |
//! | `TDiffuse`          | exits through the bottom| scalar                   | 1                      |
//! | `ATotal`            | absorption              | scalar                   | 1                      |
//! | `ROfRho`            | exits through the top   | radial annuli            | annulus area           |
//! | `TOfRho`            | exits through the bottom| radial annuli            | annulus area           |
//! | `FluenceOfRhoAndZ`  | absorption (weight/mua) | annuli x depth slabs     | ring volume            |
//!
//! ## Accumulation
//!
//! Contributions of the photon history in flight are buffered per bin. Committing the
//! history adds the buffer to the running sum and, when requested, its square to the second
//! moment; abandoning it leaves the accumulators untouched. Worker-local detector sets are
//! merged by summation once all histories have run.

pub mod detector;
pub mod events;
pub mod input;
pub mod range;
pub mod result;
pub mod set;

pub use detector::Detector;
pub use events::{TallyEvent, TallySink};
pub use input::{DetectorError, DetectorInput, DetectorKind};
pub use range::DoubleRange;
pub use result::DetectorResult;
pub use set::DetectorSet;
