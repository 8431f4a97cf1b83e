use std::path::PathBuf;
use tissuemc::engine::config::SimulationInput;

pub struct AppConfig {
    pub output_dir: PathBuf,
    pub input: SimulationInput,
}
