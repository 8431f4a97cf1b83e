use crate::core::detectors::DetectorSet;
use crate::engine::context::SimulationContext;
use crate::engine::random::stream_rng;
use crate::engine::statistics::RunStatistics;
use crate::engine::transport::TransportEngine;
use tracing::{instrument, trace};

/// A contiguous block of histories sharing one random stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    pub index: u64,
    pub histories: u64,
}

/// Splits `photon_count` histories into batches of `batch_size`; the last batch takes the
/// remainder.
pub fn plan_batches(photon_count: u64, batch_size: u64) -> Vec<BatchPlan> {
    let batch_size = batch_size.max(1);
    let full = photon_count / batch_size;
    let remainder = photon_count % batch_size;
    (0..full)
        .map(|index| BatchPlan {
            index,
            histories: batch_size,
        })
        .chain((remainder > 0).then_some(BatchPlan {
            index: full,
            histories: remainder,
        }))
        .collect()
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub index: u64,
    pub detectors: DetectorSet,
    pub statistics: RunStatistics,
}

#[instrument(level = "trace", skip_all, fields(batch = plan.index))]
pub fn run(context: &SimulationContext, seed: u64, plan: &BatchPlan) -> BatchOutcome {
    let engine = TransportEngine::new(&context.tissue, &context.source, &context.options);
    let mut rng = stream_rng(seed, plan.index);
    let mut detectors = context.detectors.empty_like();
    let mut statistics = RunStatistics::default();

    for _ in 0..plan.histories {
        let photon = engine.run_history(&mut rng, &mut detectors);
        if photon.state.is_committed() {
            detectors.end_history();
        } else {
            detectors.abandon_history();
        }
        statistics.record(photon.state, photon.collisions);
    }

    trace!(
        histories = plan.histories,
        degenerate = statistics.degenerate,
        "Batch finished."
    );
    BatchOutcome {
        index: plan.index,
        detectors,
        statistics,
    }
}
