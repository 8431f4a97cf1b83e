use crate::core::detectors::{DetectorResult, DetectorSet};
use crate::core::io::ResultsIoError;
use crate::core::io::results::{write_detector_tables, write_toml};
use crate::engine::cancellation::CancellationToken;
use crate::engine::config::{AbsorptionWeightingType, ConfigError, SimulationInput};
use crate::engine::context::SimulationContext;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::random::fresh_seed;
use crate::engine::statistics::RunStatistics;
use crate::engine::tasks::batch::{self, BatchOutcome, BatchPlan};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Batches simulated concurrently before their results are folded into the run totals.
/// Folding always happens in batch order, so the window only bounds memory.
const MERGE_WINDOW: usize = 64;

pub const SUMMARY_FILE_NAME: &str = "summary.toml";

#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutput {
    pub output_name: String,
    pub photon_count: u64,
    pub seed: u64,
    pub absorption_weighting: AbsorptionWeightingType,
    pub results: BTreeMap<String, DetectorResult>,
    pub statistics: RunStatistics,
}

#[derive(Debug, Serialize)]
struct ScalarSummary {
    mean: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    std_dev: Option<f64>,
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    output_name: &'a str,
    photon_count: u64,
    seed: u64,
    absorption_weighting: AbsorptionWeightingType,
    statistics: &'a RunStatistics,
    scalars: BTreeMap<&'a str, ScalarSummary>,
}

impl SimulationOutput {
    pub fn result(&self, name: &str) -> Option<&DetectorResult> {
        self.results.get(name)
    }

    /// Mean of a scalar detector by name.
    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.result(name).and_then(DetectorResult::scalar)
    }

    /// Writes one CSV table per detector plus `summary.toml` into `dir`.
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, ResultsIoError> {
        let mut written = write_detector_tables(dir, &self.results)?;

        let scalars = self
            .results
            .iter()
            .filter_map(|(name, result)| {
                result.scalar().map(|mean| {
                    (
                        name.as_str(),
                        ScalarSummary {
                            mean,
                            std_dev: result.scalar_std_dev(),
                        },
                    )
                })
            })
            .collect();
        let summary = RunSummary {
            output_name: &self.output_name,
            photon_count: self.photon_count,
            seed: self.seed,
            absorption_weighting: self.absorption_weighting,
            statistics: &self.statistics,
            scalars,
        };
        let summary_path = dir.join(SUMMARY_FILE_NAME);
        write_toml(&summary_path, &summary)?;
        written.push(summary_path);
        Ok(written)
    }
}

/// A validated simulation ready to run any number of times.
#[derive(Debug, Clone)]
pub struct MonteCarloSimulation {
    context: SimulationContext,
}

impl MonteCarloSimulation {
    /// Validates the whole input. No history runs unless this succeeds.
    pub fn new(input: SimulationInput) -> Result<Self, ConfigError> {
        Ok(Self {
            context: SimulationContext::new(input)?,
        })
    }

    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    pub fn run(&self, reporter: &ProgressReporter) -> Result<SimulationOutput, EngineError> {
        self.run_with_cancellation(reporter, &CancellationToken::new())
    }

    #[instrument(skip_all, name = "simulation_workflow")]
    pub fn run_with_cancellation(
        &self,
        reporter: &ProgressReporter,
        token: &CancellationToken,
    ) -> Result<SimulationOutput, EngineError> {
        let context = &self.context;
        let seed = context.options.seed.unwrap_or_else(fresh_seed);
        let plans = batch::plan_batches(context.photon_count, context.options.batch_size);
        let total_batches = plans.len() as u64;

        info!(
            photon_count = context.photon_count,
            batches = total_batches,
            seed,
            weighting = %context.options.absorption_weighting,
            "Starting photon transport."
        );
        reporter.report(Progress::PhaseStart {
            name: "Photon Transport",
        });
        reporter.report(Progress::TaskStart {
            total: context.photon_count,
        });

        let mut detectors = context.detectors.empty_like();
        let mut statistics = RunStatistics::default();
        let mut completed_batches = 0;

        for window in plans.chunks(MERGE_WINDOW) {
            let outcomes = run_window(context, seed, window, reporter, token);
            for outcome in outcomes {
                let Some(outcome) = outcome else {
                    warn!(
                        completed_batches,
                        total_batches, "Simulation cancelled; discarding partial results."
                    );
                    reporter.report(Progress::TaskFinish);
                    reporter.report(Progress::PhaseFinish);
                    return Err(EngineError::Cancelled {
                        completed_batches,
                        total_batches,
                    });
                };
                merge_outcome(&mut detectors, &mut statistics, &outcome)?;
                completed_batches += 1;
            }
        }

        reporter.report(Progress::TaskFinish);
        reporter.report(Progress::PhaseFinish);

        if statistics.launched != context.photon_count {
            return Err(EngineError::Internal(format!(
                "{} histories were run for {} requested photons",
                statistics.launched, context.photon_count
            )));
        }
        if statistics.degenerate > 0 {
            warn!(
                degenerate = statistics.degenerate,
                "Discarded numerically degenerate photon histories."
            );
        }
        if statistics.killed_over_max_collisions > 0 {
            warn!(
                killed = statistics.killed_over_max_collisions,
                max_collisions = context.options.max_collisions,
                "Photon histories hit the collision limit."
            );
        }

        let results = detectors.finalize(context.photon_count);
        info!(
            detectors = results.len(),
            exited_top = statistics.exited_top,
            exited_bottom = statistics.exited_bottom,
            absorbed = statistics.absorbed,
            "Photon transport finished."
        );

        Ok(SimulationOutput {
            output_name: context.output_name.clone(),
            photon_count: context.photon_count,
            seed,
            absorption_weighting: context.options.absorption_weighting,
            results,
            statistics,
        })
    }
}

fn run_window(
    context: &SimulationContext,
    seed: u64,
    window: &[BatchPlan],
    reporter: &ProgressReporter,
    token: &CancellationToken,
) -> Vec<Option<BatchOutcome>> {
    #[cfg(not(feature = "parallel"))]
    let iterator = window.iter();

    #[cfg(feature = "parallel")]
    let iterator = window.par_iter();

    iterator
        .map(|plan| {
            if token.is_cancelled() {
                return None;
            }
            let outcome = batch::run(context, seed, plan);
            reporter.report(Progress::TaskIncrement {
                amount: plan.histories,
            });
            Some(outcome)
        })
        .collect()
}

fn merge_outcome(
    detectors: &mut DetectorSet,
    statistics: &mut RunStatistics,
    outcome: &BatchOutcome,
) -> Result<(), EngineError> {
    detectors.merge(&outcome.detectors)?;
    statistics.merge(&outcome.statistics);
    debug!(
        batch = outcome.index,
        launched = outcome.statistics.launched,
        "Merged batch."
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::detectors::{DetectorError, DetectorInput, DetectorKind, DoubleRange};
    use crate::core::optics::properties::OpticalProperties;
    use crate::core::tissue::TissueRegion;
    use crate::engine::config::SimulationOptions;
    use tempfile::tempdir;

    fn slab(mua: f64, musp: f64, n: f64, thickness: f64) -> Vec<TissueRegion> {
        let air = OpticalProperties::ambient(1.0).unwrap();
        vec![
            TissueRegion::layer(f64::NEG_INFINITY, 0.0, air),
            TissueRegion::layer(0.0, thickness, OpticalProperties::new(mua, musp, 0.0, n).unwrap()),
            TissueRegion::layer(thickness, f64::INFINITY, air),
        ]
    }

    fn scalar_detectors(second_moment: bool) -> Vec<DetectorInput> {
        [
            DetectorKind::RDiffuse,
            DetectorKind::RSpecular,
            DetectorKind::TDiffuse,
            DetectorKind::ATotal,
        ]
        .into_iter()
        .map(|kind| DetectorInput::new(kind).with_second_moment(second_moment))
        .collect()
    }

    fn simulation(
        photon_count: u64,
        tissue: Vec<TissueRegion>,
        detectors: Vec<DetectorInput>,
        options: SimulationOptions,
    ) -> MonteCarloSimulation {
        let input = SimulationInput::builder()
            .photon_count(photon_count)
            .output_name("test")
            .tissue(tissue)
            .detectors(detectors)
            .options(options)
            .build()
            .unwrap();
        MonteCarloSimulation::new(input).unwrap()
    }

    fn seeded(seed: u64) -> SimulationOptions {
        SimulationOptions {
            seed: Some(seed),
            batch_size: 500,
            ..Default::default()
        }
    }

    #[test]
    fn transparent_slab_transmits_everything() {
        let sim = simulation(1_000, slab(0.0, 0.0, 1.0, 10.0), scalar_detectors(false), seeded(1));
        let output = sim.run(&ProgressReporter::new()).unwrap();
        assert_eq!(output.scalar("RDiffuse"), Some(0.0));
        assert_eq!(output.scalar("RSpecular"), Some(0.0));
        assert!((output.scalar("TDiffuse").unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(output.statistics.exited_bottom, 1_000);
    }

    #[test]
    fn index_matched_absorbing_slab_conserves_energy() {
        let sim = simulation(
            10_000,
            slab(0.01, 0.99, 1.0, 10.0),
            scalar_detectors(true),
            seeded(2024),
        );
        let output = sim.run(&ProgressReporter::new()).unwrap();

        let rd = output.scalar("RDiffuse").unwrap();
        let td = output.scalar("TDiffuse").unwrap();
        let a = output.scalar("ATotal").unwrap();
        assert_eq!(output.scalar("RSpecular"), Some(0.0));
        assert!(rd > 0.0 && td > 0.0 && a > 0.0);
        assert!(rd + td < 1.0);

        let lost = output.statistics.killed_over_max_collisions as f64 / 10_000.0;
        assert!((rd + td + a + lost - 1.0).abs() < 1e-9);

        let sd = output.result("RDiffuse").unwrap().scalar_std_dev().unwrap();
        assert!(sd > 0.0 && sd / rd < 0.05, "relative error {}", sd / rd);
    }

    #[test]
    fn mismatched_index_gives_fresnel_specular_reflectance() {
        let options = SimulationOptions {
            absorption_weighting: AbsorptionWeightingType::Discrete,
            ..seeded(5)
        };
        let sim = simulation(2_000, slab(0.1, 1.0, 1.4, 1.0), scalar_detectors(false), options);
        let output = sim.run(&ProgressReporter::new()).unwrap();

        let expected = ((1.0_f64 - 1.4) / (1.0 + 1.4)).powi(2);
        assert!((output.scalar("RSpecular").unwrap() - expected).abs() < 1e-12);

        let total: f64 = ["RDiffuse", "RSpecular", "TDiffuse", "ATotal"]
            .iter()
            .map(|name| output.scalar(name).unwrap())
            .sum();
        assert!((total - 1.0).abs() < 0.01, "total weight {total}");
    }

    #[test]
    fn matched_slab_reproduces_van_de_hulst_reference() {
        // a = 0.9, g = 0.75, optical thickness 2: Rd = 0.09739, Tt = 0.66096.
        let air = OpticalProperties::ambient(1.0).unwrap();
        let tissue = vec![
            TissueRegion::layer(f64::NEG_INFINITY, 0.0, air),
            TissueRegion::layer(0.0, 2.0, OpticalProperties::new(0.1, 0.225, 0.75, 1.0).unwrap()),
            TissueRegion::layer(2.0, f64::INFINITY, air),
        ];
        for weighting in [
            AbsorptionWeightingType::Analog,
            AbsorptionWeightingType::Discrete,
        ] {
            let options = SimulationOptions {
                absorption_weighting: weighting,
                ..seeded(1234)
            };
            let sim = simulation(50_000, tissue.clone(), scalar_detectors(false), options);
            let output = sim.run(&ProgressReporter::new()).unwrap();

            let rd = output.scalar("RDiffuse").unwrap();
            let tt = output.scalar("TDiffuse").unwrap();
            assert!((rd - 0.09739).abs() < 0.006, "{weighting:?} Rd {rd}");
            assert!((tt - 0.66096).abs() < 0.01, "{weighting:?} Tt {tt}");
        }
    }

    #[test]
    fn standard_error_shrinks_with_square_root_of_photon_count() {
        let detectors = vec![DetectorInput::new(DetectorKind::RDiffuse).with_second_moment(true)];
        let run = |n: u64| {
            let sim = simulation(n, slab(0.1, 1.0, 1.0, 2.0), detectors.clone(), seeded(77));
            let output = sim.run(&ProgressReporter::new()).unwrap();
            output.result("RDiffuse").unwrap().scalar_std_dev().unwrap()
        };
        let ratio = run(2_000) / run(8_000);
        assert!((1.6..2.4).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn same_seed_gives_identical_outputs() {
        let rho = DoubleRange::new(0.0, 5.0, 26).unwrap();
        let z = DoubleRange::new(0.0, 2.0, 11).unwrap();
        let mut detectors = scalar_detectors(true);
        detectors.push(DetectorInput::new(DetectorKind::ROfRho { rho }).with_second_moment(true));
        detectors.push(DetectorInput::new(DetectorKind::FluenceOfRhoAndZ { rho, z }));
        let options = SimulationOptions {
            absorption_weighting: AbsorptionWeightingType::Continuous,
            ..seeded(11)
        };
        let sim = simulation(3_000, slab(0.1, 1.0, 1.4, 2.0), detectors, options);

        let a = sim.run(&ProgressReporter::new()).unwrap();
        let b = sim.run(&ProgressReporter::new()).unwrap();
        assert_eq!(a.results, b.results);
        assert_eq!(a.statistics, b.statistics);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn outputs_do_not_depend_on_thread_count() {
        let rho = DoubleRange::new(0.0, 5.0, 26).unwrap();
        let mut detectors = scalar_detectors(true);
        detectors.push(DetectorInput::new(DetectorKind::ROfRho { rho }).with_second_moment(true));
        let sim = simulation(4_000, slab(0.05, 1.0, 1.33, 3.0), detectors, seeded(3));

        let run_on = |threads: usize| {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap();
            pool.install(|| sim.run(&ProgressReporter::new()).unwrap())
        };
        let single = run_on(1);
        let many = run_on(4);
        assert_eq!(single.results, many.results);
        assert_eq!(single.statistics, many.statistics);
    }

    #[test]
    fn unseeded_run_records_a_reproducible_seed() {
        let options = SimulationOptions {
            seed: None,
            ..seeded(0)
        };
        let sim = simulation(500, slab(0.1, 1.0, 1.0, 1.0), scalar_detectors(false), options);
        let first = sim.run(&ProgressReporter::new()).unwrap();

        let replay = simulation(
            500,
            slab(0.1, 1.0, 1.0, 1.0),
            scalar_detectors(false),
            seeded(first.seed),
        );
        let second = replay.run(&ProgressReporter::new()).unwrap();
        assert_eq!(first.results, second.results);
    }

    #[test]
    fn cancelled_run_returns_no_results() {
        let sim = simulation(5_000, slab(0.1, 1.0, 1.0, 1.0), scalar_detectors(false), seeded(1));
        let token = CancellationToken::new();
        token.cancel();
        let err = sim
            .run_with_cancellation(&ProgressReporter::new(), &token)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Cancelled {
                completed_batches: 0,
                total_batches: 10
            }
        ));
    }

    #[test]
    fn progress_reports_every_history() {
        use std::sync::atomic::{AtomicU64, Ordering};
        let counted = AtomicU64::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::TaskIncrement { amount } = event {
                counted.fetch_add(amount, Ordering::Relaxed);
            }
        }));
        let sim = simulation(1_234, slab(0.1, 1.0, 1.0, 1.0), scalar_detectors(false), seeded(1));
        sim.run(&reporter).unwrap();
        drop(reporter);
        assert_eq!(counted.load(Ordering::Relaxed), 1_234);
    }

    #[test]
    fn invalid_configuration_is_rejected_before_running() {
        let input = SimulationInput::builder()
            .photon_count(0)
            .tissue(slab(0.1, 1.0, 1.0, 1.0))
            .build()
            .unwrap();
        assert_eq!(
            MonteCarloSimulation::new(input).unwrap_err(),
            ConfigError::InvalidPhotonCount(0)
        );
    }

    #[test]
    fn detector_names_outside_output_directory_are_rejected_before_running() {
        for name in ["../escaped", "sub/T"] {
            let input = SimulationInput::builder()
                .photon_count(10)
                .tissue(slab(0.1, 1.0, 1.0, 1.0))
                .detector(DetectorInput::new(DetectorKind::TDiffuse).with_name(name))
                .build()
                .unwrap();
            assert_eq!(
                MonteCarloSimulation::new(input).unwrap_err(),
                ConfigError::Detector(DetectorError::InvalidName(name.to_string()))
            );
        }
    }

    #[test]
    fn output_is_written_as_tables_and_summary() {
        let rho = DoubleRange::new(0.0, 2.0, 5).unwrap();
        let mut detectors = scalar_detectors(true);
        detectors.push(DetectorInput::new(DetectorKind::ROfRho { rho }));
        let sim = simulation(200, slab(0.1, 1.0, 1.4, 1.0), detectors, seeded(8));
        let output = sim.run(&ProgressReporter::new()).unwrap();

        let dir = tempdir().unwrap();
        let paths = output.write_to_dir(dir.path()).unwrap();
        assert_eq!(paths.len(), 6);
        assert!(dir.path().join("ROfRho.csv").exists());

        let summary = std::fs::read_to_string(dir.path().join(SUMMARY_FILE_NAME)).unwrap();
        assert!(summary.contains("output_name = \"test\""));
        assert!(summary.contains("seed = 8"));
        assert!(summary.contains("[scalars.RDiffuse]"));
        assert!(summary.contains("[statistics]"));
    }
}
