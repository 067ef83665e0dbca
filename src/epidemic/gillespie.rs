//! Optimized Gillespie simulator for the SIS process on a static network.
//!
//! Rates:
//! - cure of each infected vertex at rate 1
//! - transmission along each edge out of an infected vertex at rate λ
//!
//! The total rate is `R = I + λ·K` where `K` is the summed degree of the
//! infected vertices. Transmission sources are drawn proportionally to degree
//! by rejection against `kmax`, so no cumulative-weight table is maintained.
//! A transmission that lands on an already infected neighbor is a phantom
//! event and changes nothing; counting it keeps `R` exact.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::infected::InfectedSet;
use crate::error::{Result, SisError};
use crate::graph::StaticGraph;

/// Floor for the uniform draw of the waiting time, keeps `ln(u)` finite.
const MIN_UNIFORM: f64 = 1e-12;

/// Parameters of an SIS ensemble run. The cure rate is fixed at 1.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Number of independent realizations.
    pub samples: u64,
    /// Infection rate per edge (λ).
    pub lambda: f64,
    /// Horizon, in whole time units. Also the number of time bins.
    pub t_max: u32,
    /// Fraction of vertices infected at t = 0, in (0, 1].
    pub initial_fraction: f64,
    /// Cap on candidate draws for a single transmission source.
    pub max_rejection_draws: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            samples: 1,
            lambda: 1.0,
            t_max: 100,
            initial_fraction: 1.0,
            max_rejection_draws: 10_000_000,
        }
    }
}

impl SimulationConfig {
    /// Reject parameters outside their domains with `InvalidParameter`.
    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            return Err(SisError::InvalidParameter(
                "sample count must be positive".into(),
            ));
        }
        if !self.lambda.is_finite() || self.lambda < 0.0 {
            return Err(SisError::InvalidParameter(format!(
                "infection rate must be a finite non-negative number, got {}",
                self.lambda
            )));
        }
        if self.t_max == 0 {
            return Err(SisError::InvalidParameter(
                "time horizon must be positive".into(),
            ));
        }
        if !(self.initial_fraction > 0.0 && self.initial_fraction <= 1.0) {
            return Err(SisError::InvalidParameter(format!(
                "initial fraction must lie in (0, 1], got {}",
                self.initial_fraction
            )));
        }
        if self.max_rejection_draws == 0 {
            return Err(SisError::InvalidParameter(
                "rejection draw cap must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Exact number of initially infected vertices, `floor(n · fraction)`.
    pub fn initial_infected(&self, n_nodes: usize) -> usize {
        ((n_nodes as f64 * self.initial_fraction).floor() as usize).min(n_nodes)
    }
}

/// How a realization ended. Both are normal terminations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// No infected vertex left.
    Absorbed,
    /// Clock passed the horizon with infection still present.
    HorizonReached,
}

/// Outcome of a single event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SisEvent {
    Cure { vertex: usize },
    Infection { source: usize, target: usize },
    /// Transmission onto an already infected neighbor.
    Phantom { source: usize, target: usize },
}

/// Per-realization event tallies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventCounters {
    /// All events, phantoms included.
    pub events: u64,
    pub cures: u64,
    /// Transmissions that infected a susceptible neighbor.
    pub infections: u64,
    /// Transmissions onto an already infected neighbor.
    pub phantoms: u64,
    /// Candidates drawn while sampling transmission sources.
    pub rejection_draws: u64,
}

/// Values observed when the clock crosses an integer bin boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BinSnapshot {
    /// 1-based bin index.
    pub bin: usize,
    pub prevalence: f64,
    pub time: f64,
    pub survived: bool,
}

/// Mutable state of one realization.
#[derive(Clone, Debug)]
pub struct SisState {
    infected: InfectedSet,
    time: f64,
    counters: EventCounters,
}

impl SisState {
    pub fn infected(&self) -> &InfectedSet {
        &self.infected
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn counters(&self) -> &EventCounters {
        &self.counters
    }

    /// No infected vertex left.
    pub fn is_absorbed(&self) -> bool {
        self.infected.is_empty()
    }
}

/// Summary of one completed realization.
#[derive(Clone, Debug)]
pub struct Realization {
    pub snapshots: Vec<BinSnapshot>,
    pub termination: Termination,
    pub initial_infected: usize,
    pub final_infected: usize,
    pub final_time: f64,
    pub counters: EventCounters,
}

/// SIS simulator bound to a read-only network.
#[derive(Clone, Debug)]
pub struct GillespieSimulator<'g> {
    graph: &'g StaticGraph,
    config: SimulationConfig,
}

impl<'g> GillespieSimulator<'g> {
    /// Create a simulator after validating the configuration against the graph.
    pub fn new(graph: &'g StaticGraph, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        if graph.edge_count() > 0 && graph.max_degree() == 0 {
            return Err(SisError::PrecondAborted(
                "graph has edges but a maximum degree of zero".into(),
            ));
        }
        Ok(Self { graph, config })
    }

    /// Network the simulator runs on.
    pub fn graph(&self) -> &'g StaticGraph {
        self.graph
    }

    /// Validated run parameters.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Random initial condition with exactly `floor(N · fraction)` infected.
    ///
    /// Vertices are taken from a uniformly random permutation of all nodes.
    pub fn seed<R: Rng + ?Sized>(&self, rng: &mut R) -> SisState {
        let n = self.graph.node_count();
        let target = self.config.initial_infected(n);
        let mut infected = InfectedSet::new(n);

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        for &v in order.iter().take(target) {
            infected.insert(v, self.graph.degree(v));
        }

        SisState {
            infected,
            time: 0.0,
            counters: EventCounters::default(),
        }
    }

    /// Advance the clock by one event. Returns `None` on an absorbed state.
    pub fn step<R: Rng + ?Sized>(&self, state: &mut SisState, rng: &mut R) -> Result<Option<SisEvent>> {
        if state.is_absorbed() {
            return Ok(None);
        }

        let n_infected = state.infected.len() as f64;
        let total_rate = n_infected + self.config.lambda * state.infected.sum_degrees() as f64;

        let u = (1.0 - rng.gen::<f64>()).max(MIN_UNIFORM);
        state.time += -u.ln() / total_rate;
        state.counters.events += 1;

        let event = if rng.gen::<f64>() < n_infected / total_rate {
            let (slot, vertex) = state
                .infected
                .pick_uniform(rng)
                .ok_or_else(|| SisError::PrecondAborted("cure on an empty set".into()))?;
            state.infected.remove_at(slot);
            state.counters.cures += 1;
            SisEvent::Cure { vertex }
        } else {
            let (source, draws) = sample_degree_proportional(
                self.graph,
                &state.infected,
                rng,
                self.config.max_rejection_draws,
            )?;
            state.counters.rejection_draws += draws;

            let target = *self.graph.neighbors(source).choose(rng).ok_or_else(|| {
                SisError::PrecondAborted(format!("transmission source {source} has no neighbors"))
            })?;

            if state.infected.contains(target) {
                state.counters.phantoms += 1;
                SisEvent::Phantom { source, target }
            } else {
                state.infected.insert(target, self.graph.degree(target));
                state.counters.infections += 1;
                SisEvent::Infection { source, target }
            }
        };

        Ok(Some(event))
    }

    /// Run one realization until absorption or until the clock passes `t_max`.
    ///
    /// After every event, each integer bin boundary the clock has reached gets
    /// one snapshot of the post-event prevalence and current time.
    pub fn simulate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Realization> {
        let n = self.graph.node_count();
        let horizon = self.config.t_max as f64;
        let last_bin = self.config.t_max as usize;

        let mut state = self.seed(rng);
        let initial_infected = state.infected.len();
        let mut snapshots = Vec::new();
        let mut next_bin = 1usize;

        while !state.is_absorbed() && state.time <= horizon {
            self.step(&mut state, rng)?;

            while next_bin <= last_bin && state.time >= next_bin as f64 {
                let n_infected = state.infected.len();
                snapshots.push(BinSnapshot {
                    bin: next_bin,
                    prevalence: n_infected as f64 / n as f64,
                    time: state.time,
                    survived: n_infected > 0,
                });
                next_bin += 1;
            }
        }

        let termination = if state.is_absorbed() {
            Termination::Absorbed
        } else {
            Termination::HorizonReached
        };

        debug!(
            ?termination,
            time = state.time,
            events = state.counters.events,
            cures = state.counters.cures,
            infections = state.counters.infections,
            phantoms = state.counters.phantoms,
            rejection_draws = state.counters.rejection_draws,
            "realization finished"
        );

        Ok(Realization {
            snapshots,
            termination,
            initial_infected,
            final_infected: state.infected.len(),
            final_time: state.time,
            counters: state.counters,
        })
    }
}

/// Draw an infected vertex with probability proportional to its degree.
///
/// Candidates are drawn uniformly from `infected` and accepted with
/// probability `degree / kmax`. Returns the accepted vertex and the number of
/// draws it took. Fails once `max_draws` candidates have been rejected, which
/// only happens when no member has positive degree.
pub fn sample_degree_proportional<R: Rng + ?Sized>(
    graph: &StaticGraph,
    infected: &InfectedSet,
    rng: &mut R,
    max_draws: u64,
) -> Result<(usize, u64)> {
    let kmax = graph.max_degree();
    if kmax == 0 {
        return Err(SisError::PrecondAborted(
            "degree-proportional sampling needs kmax >= 1".into(),
        ));
    }
    let kmax = kmax as f64;

    for draw in 1..=max_draws {
        let (_, v) = infected
            .pick_uniform(rng)
            .ok_or_else(|| SisError::PrecondAborted("no infected vertex to sample".into()))?;
        if rng.gen::<f64>() < graph.degree(v) as f64 / kmax {
            return Ok((v, draw));
        }
    }

    Err(SisError::PrecondAborted(format!(
        "rejection sampling gave up after {max_draws} draws"
    )))
}
