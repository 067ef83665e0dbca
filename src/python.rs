//! Python bindings (feature `python`).

use numpy::PyArray1;
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use crate::epidemic::{
    resolve_seed, run_ensemble, run_ensemble_parallel, Normalization, SimulationConfig,
};
use crate::error::SisError;
use crate::graph::StaticGraph;
use crate::output::{write_prevalence_file, OutputMetadata};

fn to_py_err(err: SisError) -> PyErr {
    match err {
        SisError::Io { .. } => PyIOError::new_err(err.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

fn build_config(
    samples: u64,
    infection_rate: f64,
    t_max: u32,
    initial_fraction: f64,
) -> SimulationConfig {
    SimulationConfig {
        samples,
        lambda: infection_rate,
        t_max,
        initial_fraction,
        ..SimulationConfig::default()
    }
}

/// Simulate an SIS ensemble and return the averaged time series.
///
/// # Arguments
/// * `edges` - List of `(u, v)` integer node pairs
/// * `nodes` - Extra node labels, so isolated vertices count toward N
/// * `samples` - Number of realizations
/// * `infection_rate` - λ, with the cure rate fixed at 1
/// * `t_max` - Horizon in whole time units
/// * `initial_fraction` - Fraction infected at t = 0
/// * `seed` - Base RNG seed (realization i uses seed + i); random when omitted
/// * `quasi_stationary` - Divide prevalence by surviving samples
/// * `parallel` - Run realizations on the rayon pool
///
/// # Returns
/// * Tuple of (mean_time, mean_prevalence) arrays
#[pyfunction]
#[pyo3(signature = (edges, samples, infection_rate, t_max, initial_fraction, nodes=None, seed=None, quasi_stationary=false, parallel=false))]
#[allow(clippy::too_many_arguments)]
fn simulate_sis<'py>(
    py: Python<'py>,
    edges: Vec<(i64, i64)>,
    samples: u64,
    infection_rate: f64,
    t_max: u32,
    initial_fraction: f64,
    nodes: Option<Vec<i64>>,
    seed: Option<u64>,
    quasi_stationary: bool,
    parallel: bool,
) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>)> {
    let graph = StaticGraph::from_parts(nodes.unwrap_or_default(), edges);
    let config = build_config(samples, infection_rate, t_max, initial_fraction);
    let seed = resolve_seed(seed);

    let ensemble = if parallel {
        run_ensemble_parallel(&graph, &config, seed)
    } else {
        run_ensemble(&graph, &config, seed, |_, _| Ok(()))
    }
    .map_err(to_py_err)?;

    let normalization = if quasi_stationary {
        Normalization::Surviving
    } else {
        Normalization::AllSamples
    };
    let (times, prevalence): (Vec<f64>, Vec<f64>) = ensemble
        .points(normalization)
        .into_iter()
        .map(|p| (p.time, p.prevalence))
        .unzip();

    Ok((PyArray1::from_vec(py, times), PyArray1::from_vec(py, prevalence)))
}

/// Simulate an SIS ensemble, rewriting `output` after every realization.
///
/// `nodes` and `seed` behave as in `simulate_sis`.
#[pyfunction]
#[pyo3(signature = (edges, output, samples, infection_rate, t_max, initial_fraction, nodes=None, seed=None))]
#[allow(clippy::too_many_arguments)]
fn dyn_run(
    edges: Vec<(i64, i64)>,
    output: std::path::PathBuf,
    samples: u64,
    infection_rate: f64,
    t_max: u32,
    initial_fraction: f64,
    nodes: Option<Vec<i64>>,
    seed: Option<u64>,
) -> PyResult<()> {
    let graph = StaticGraph::from_parts(nodes.unwrap_or_default(), edges);
    let config = build_config(samples, infection_rate, t_max, initial_fraction);
    let seed = resolve_seed(seed);
    let meta = OutputMetadata::new(&graph, &config);

    run_ensemble(&graph, &config, seed, |_, ensemble| {
        write_prevalence_file(&output, &meta, &ensemble.points(Normalization::AllSamples))
    })
    .map_err(to_py_err)?;
    Ok(())
}

#[pymodule]
fn dynsis(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(simulate_sis, m)?)?;
    m.add_function(wrap_pyfunction!(dyn_run, m)?)?;
    Ok(())
}
