use crate::cli::{RunArgs, ValidateArgs};
use crate::config::build_config;
use crate::error::{CliError, Result};
use tissuemc::workflows::simulate::MonteCarloSimulation;
use tracing::info;

/// Builds and validates the simulation exactly as `run` would, then describes it.
pub fn run(args: ValidateArgs) -> Result<()> {
    let run_args = RunArgs {
        config: args.config,
        output_dir: None,
        photon_count: None,
        seed: None,
        absorption_weighting: None,
        set_values: args.set_values,
    };
    let app = build_config(&run_args)?;
    let simulation =
        MonteCarloSimulation::new(app.input).map_err(|e| CliError::Config(e.to_string()))?;
    info!("Configuration {:?} is valid.", run_args.config);

    println!("{}", describe(&simulation));
    Ok(())
}

fn describe(simulation: &MonteCarloSimulation) -> String {
    let context = simulation.context();
    let mut lines = vec![
        format!("✓ Configuration for '{}' is valid.", context.output_name),
        format!("  photons:     {}", context.photon_count),
        format!("  weighting:   {}", context.options.absorption_weighting),
        format!(
            "  seed:        {}",
            context
                .options
                .seed
                .map_or_else(|| "fresh per run".to_string(), |s| s.to_string())
        ),
        format!(
            "  layers:      {} between z = {} and z = {}",
            context.tissue.layer_indices().len(),
            context.tissue.top_surface(),
            context.tissue.bottom_surface()
        ),
    ];
    for detector in context.detectors.iter() {
        lines.push(format!(
            "  detector:    {} ({} bin(s))",
            detector.name(),
            detector.bin_count()
        ));
    }
    lines.join("\n")
}
