//! Ensemble statistics over independent SIS realizations.
//!
//! Every realization adds its bin snapshots into an `EnsembleAccumulator`.
//! Totals are only ever added to, so partial accumulators built on separate
//! workers can be merged in any order.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::info;

use super::gillespie::{GillespieSimulator, Realization, SimulationConfig};
use crate::error::Result;
use crate::graph::StaticGraph;

/// Cumulative sums for one time bin.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BinTotals {
    pub prevalence_sum: f64,
    pub time_sum: f64,
    pub samples: u64,
    pub survived: u64,
}

/// One line of the averaged time series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrevalencePoint {
    pub time: f64,
    pub prevalence: f64,
}

/// Denominator used for the prevalence column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Normalization {
    /// Divide by all completed realizations.
    #[default]
    AllSamples,
    /// Divide by realizations still active in the bin (quasi-stationary).
    Surviving,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnsembleAccumulator {
    bins: Vec<BinTotals>,
    deepest_bin: usize,
    realizations: u64,
}

impl EnsembleAccumulator {
    /// Empty accumulator with bins `1..=t_max`.
    pub fn new(t_max: u32) -> Self {
        Self {
            bins: vec![BinTotals::default(); t_max as usize],
            deepest_bin: 0,
            realizations: 0,
        }
    }

    /// Add one realization's observation for a 1-based bin.
    ///
    /// Bins past the table are ignored.
    pub fn record_bin(&mut self, bin: usize, prevalence: f64, time: f64, survived: bool) {
        let Some(totals) = bin.checked_sub(1).and_then(|i| self.bins.get_mut(i)) else {
            return;
        };
        totals.prevalence_sum += prevalence;
        totals.time_sum += time;
        totals.samples += 1;
        if survived {
            totals.survived += 1;
            self.deepest_bin = self.deepest_bin.max(bin);
        }
    }

    /// Fold a whole realization in and count it as completed.
    pub fn absorb(&mut self, realization: &Realization) {
        for snap in &realization.snapshots {
            self.record_bin(snap.bin, snap.prevalence, snap.time, snap.survived);
        }
        self.realizations += 1;
    }

    /// Combine two partial accumulators over the same horizon.
    pub fn merge(mut self, other: Self) -> Self {
        if other.bins.len() > self.bins.len() {
            self.bins.resize(other.bins.len(), BinTotals::default());
        }
        for (mine, theirs) in self.bins.iter_mut().zip(&other.bins) {
            mine.prevalence_sum += theirs.prevalence_sum;
            mine.time_sum += theirs.time_sum;
            mine.samples += theirs.samples;
            mine.survived += theirs.survived;
        }
        self.deepest_bin = self.deepest_bin.max(other.deepest_bin);
        self.realizations += other.realizations;
        self
    }

    /// Completed realizations absorbed so far.
    pub fn realizations(&self) -> u64 {
        self.realizations
    }

    /// Deepest bin any realization reached with infection still present.
    pub fn deepest_bin(&self) -> usize {
        self.deepest_bin
    }

    /// Raw totals for bins `1..=t_max`, index 0 holding bin 1.
    pub fn bins(&self) -> &[BinTotals] {
        &self.bins
    }

    /// Mean time and mean prevalence over `realizations` samples, for bins
    /// `1..=deepest_bin`.
    pub fn normalize(&self, realizations: u64) -> Vec<PrevalencePoint> {
        self.populated()
            .map(|b| PrevalencePoint {
                time: ratio(b.time_sum, b.samples),
                prevalence: ratio(b.prevalence_sum, realizations),
            })
            .collect()
    }

    /// Prevalence conditioned on survival: divides by the surviving count of
    /// each bin instead of the number of realizations.
    pub fn normalize_quasi_stationary(&self) -> Vec<PrevalencePoint> {
        self.populated()
            .map(|b| PrevalencePoint {
                time: ratio(b.time_sum, b.samples),
                prevalence: ratio(b.prevalence_sum, b.survived),
            })
            .collect()
    }

    /// Output rows under the chosen denominator.
    pub fn points(&self, normalization: Normalization) -> Vec<PrevalencePoint> {
        match normalization {
            Normalization::AllSamples => self.normalize(self.realizations),
            Normalization::Surviving => self.normalize_quasi_stationary(),
        }
    }

    fn populated(&self) -> impl Iterator<Item = &BinTotals> {
        self.bins.iter().take(self.deepest_bin)
    }
}

fn ratio(sum: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// RNG for realization `index`, derived from the base seed.
pub fn realization_rng(seed: u64, index: u64) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(index))
}

/// Use the given seed, or draw a fresh one from the OS-backed thread RNG.
///
/// The resolved value is logged so any run can be replayed.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    let seed = seed.unwrap_or_else(rand::random);
    info!(seed, "using seed");
    seed
}

/// Run `config.samples` realizations one after another.
///
/// `checkpoint` is called after every realization with the number completed
/// so far and the accumulator, so callers can persist partial results.
pub fn run_ensemble<F>(
    graph: &StaticGraph,
    config: &SimulationConfig,
    seed: u64,
    mut checkpoint: F,
) -> Result<EnsembleAccumulator>
where
    F: FnMut(u64, &EnsembleAccumulator) -> Result<()>,
{
    let simulator = GillespieSimulator::new(graph, config.clone())?;
    let mut ensemble = EnsembleAccumulator::new(config.t_max);

    for index in 0..config.samples {
        let sample = index + 1;
        info!(sample, "sample started");
        let mut rng = realization_rng(seed, index);
        let realization = simulator.simulate(&mut rng)?;
        info!(
            sample,
            termination = ?realization.termination,
            time = realization.final_time,
            infected = realization.final_infected,
            "sample done"
        );
        ensemble.absorb(&realization);
        checkpoint(sample, &ensemble)?;
    }

    Ok(ensemble)
}

/// Run all realizations on the rayon pool.
///
/// Each worker folds into a private accumulator and the partials are merged
/// at the end. Realization `i` uses the same RNG stream as in `run_ensemble`.
pub fn run_ensemble_parallel(
    graph: &StaticGraph,
    config: &SimulationConfig,
    seed: u64,
) -> Result<EnsembleAccumulator> {
    let simulator = GillespieSimulator::new(graph, config.clone())?;
    let t_max = config.t_max;

    let ensemble = (0..config.samples)
        .into_par_iter()
        .try_fold(
            || EnsembleAccumulator::new(t_max),
            |mut acc, index| -> Result<EnsembleAccumulator> {
                let mut rng = realization_rng(seed, index);
                let realization = simulator.simulate(&mut rng)?;
                acc.absorb(&realization);
                Ok(acc)
            },
        )
        .try_reduce(|| EnsembleAccumulator::new(t_max), |a, b| Ok(a.merge(b)))?;

    info!(
        samples = ensemble.realizations(),
        deepest_bin = ensemble.deepest_bin(),
        "parallel ensemble done"
    );
    Ok(ensemble)
}
