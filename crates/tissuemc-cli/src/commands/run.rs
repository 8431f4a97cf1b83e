use crate::cli::RunArgs;
use crate::config::build_config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use std::path::PathBuf;
use tissuemc::engine::progress::ProgressReporter;
use tissuemc::workflows::simulate::{MonteCarloSimulation, SimulationOutput};
use tracing::{info, warn};

pub fn run(args: RunArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app = build_config(&args)?;

    let simulation =
        MonteCarloSimulation::new(app.input).map_err(|e| CliError::Config(e.to_string()))?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Tracing {} photon histories...",
        simulation.context().photon_count
    );
    info!("Invoking the simulation workflow...");
    let output = simulation.run(&reporter)?;

    if output.statistics.degenerate > 0 {
        warn!(
            degenerate = output.statistics.degenerate,
            "Some histories were discarded as numerically degenerate."
        );
    }

    let written = write_output(&output, &app.output_dir)?;
    print_summary(&output);
    println!(
        "✓ Wrote {} file(s) to {} (seed {}).",
        written.len(),
        app.output_dir.display(),
        output.seed
    );
    Ok(())
}

fn write_output(output: &SimulationOutput, dir: &std::path::Path) -> Result<Vec<PathBuf>> {
    info!("Writing results to {:?}", dir);
    let written = output.write_to_dir(dir)?;
    for path in &written {
        info!("Wrote {:?}", path);
    }
    Ok(written)
}

fn print_summary(output: &SimulationOutput) {
    for (name, result) in &output.results {
        let Some(mean) = result.scalar() else {
            continue;
        };
        match result.scalar_std_dev() {
            Some(std_dev) => println!("  {:<16} {:.6} ± {:.6}", name, mean, std_dev),
            None => println!("  {:<16} {:.6}", name, mean),
        }
    }
}
