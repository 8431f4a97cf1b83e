use tissuemc::core::detectors::{DetectorInput, DetectorKind};
use tissuemc::engine::config::SimulationOptions;

pub struct DefaultsConfig {
    pub output_name: String,
    pub refractive_index: f64,
    pub anisotropy: f64,
    pub tally_second_moment: bool,
    pub options: SimulationOptions,
    pub detectors: Vec<DetectorInput>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_name: "results".to_string(),
            refractive_index: 1.0,
            anisotropy: 0.0,
            tally_second_moment: false,
            options: SimulationOptions::default(),
            detectors: vec![
                DetectorInput::new(DetectorKind::RSpecular),
                DetectorInput::new(DetectorKind::RDiffuse),
                DetectorInput::new(DetectorKind::TDiffuse),
                DetectorInput::new(DetectorKind::ATotal),
            ],
        }
    }
}
