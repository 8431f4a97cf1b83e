use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tissuemc::engine::config::AbsorptionWeightingType;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The tissuemc developers",
    version,
    about = "tissuemc CLI - Monte Carlo photon transport in layered biological tissue.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to trace photon batches.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a simulation and write detector tables plus a run summary.
    Run(RunArgs),
    /// Check a simulation configuration without tracing any photons.
    Validate(ValidateArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the simulation configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Directory receiving one CSV per detector and `summary.toml`.
    /// Defaults to a directory named after the run's output name.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Override the number of photon histories.
    #[arg(short = 'n', long, value_name = "NUM")]
    pub photon_count: Option<u64>,

    /// Override the run seed. Without one a fresh seed is drawn and recorded.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Override the absorption weighting scheme (analog, discrete or continuous).
    #[arg(short = 'a', long, value_name = "SCHEME")]
    pub absorption_weighting: Option<AbsorptionWeightingType>,

    /// Override a configuration value, e.g. `-S options.batch-size=5000` or
    /// `-S tissue.regions.1.mua=0.02`. Can be repeated.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

/// Arguments for the `validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the simulation configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Apply the same `KEY=VALUE` overrides `run` accepts before validating.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}
