//! SIS epidemic dynamics on static networks.
//!
//! Components:
//! - InfectedSet: O(1) dense set of infected vertices with degree sum
//! - GillespieSimulator: optimized Gillespie event loop for one realization
//! - EnsembleAccumulator: time-binned averages across realizations

pub mod ensemble;
pub mod gillespie;
pub mod infected;

pub use ensemble::{
    realization_rng, resolve_seed, run_ensemble, run_ensemble_parallel, BinTotals,
    EnsembleAccumulator, Normalization, PrevalencePoint,
};
pub use gillespie::{
    sample_degree_proportional, BinSnapshot, EventCounters, GillespieSimulator, Realization,
    SimulationConfig, SisEvent, SisState, Termination,
};
pub use infected::InfectedSet;
