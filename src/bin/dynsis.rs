use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use dynsis::{
    load_run_config, resolve_seed, run_ensemble, run_ensemble_parallel, write_prevalence_file,
    Normalization, OutputMetadata, RunConfig, SimulationConfig, SimulationSection, StaticGraph,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// SIS epidemics on networks with the optimized Gillespie algorithm.
#[derive(Parser, Debug)]
#[command(name = "dynsis")]
struct Args {
    /// Output file, rewritten after every sample.
    output: PathBuf,

    /// Edge list, one comma-separated integer pair per line.
    #[arg(long, required_unless_present = "karate", conflicts_with = "karate")]
    edges: Option<PathBuf>,

    /// Use Zachary's karate club network.
    #[arg(long)]
    karate: bool,

    /// TOML run configuration; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, env = "DYNSIS_SAMPLES")]
    samples: Option<u64>,

    /// Infection rate; the cure rate is 1.
    #[arg(long, env = "DYNSIS_LAMBDA")]
    lambda: Option<f64>,

    /// Maximum time (stops earlier on absorption).
    #[arg(long, env = "DYNSIS_T_MAX")]
    t_max: Option<u32>,

    /// Fraction of vertices infected at t = 0, drawn anew for each sample.
    #[arg(long, env = "DYNSIS_INITIAL_FRACTION")]
    initial_fraction: Option<f64>,

    #[arg(long)]
    max_rejection_draws: Option<u64>,

    #[arg(long, env = "DYNSIS_SEED")]
    seed: Option<u64>,

    /// Divide prevalence by surviving samples instead of all samples.
    #[arg(long)]
    quasi_stationary: bool,

    /// Run samples in parallel; the output is written once at the end.
    #[arg(long)]
    parallel: bool,
}

/// Merge flags over the run file into a validated config.
///
/// Required parameters missing from both yield a clap usage error.
fn simulation_config(args: &Args, file: &RunConfig) -> anyhow::Result<SimulationConfig> {
    let flags = SimulationSection {
        samples: args.samples,
        lambda: args.lambda,
        t_max: args.t_max,
        initial_fraction: args.initial_fraction,
        max_rejection_draws: args.max_rejection_draws,
    };
    let section = flags.or(file.simulation.clone());
    match section.resolve() {
        Some(config) => Ok(config?),
        None => Err(Args::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                format!("missing parameters: --{}", section.missing().join(", --")),
            )
            .into()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let file = match &args.config {
        Some(path) => load_run_config(path)?,
        None => RunConfig::default(),
    };
    let config = match simulation_config(&args, &file) {
        Ok(config) => config,
        Err(err) => match err.downcast::<clap::Error>() {
            Ok(usage) => usage.exit(),
            Err(err) => return Err(err),
        },
    };

    let graph = match &args.edges {
        Some(path) => StaticGraph::from_edge_list_file(path)?,
        None => StaticGraph::karate_club(),
    };
    let seed = resolve_seed(args.seed.or(file.seed));
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        kmax = graph.max_degree(),
        samples = config.samples,
        lambda = config.lambda,
        t_max = config.t_max,
        initial_fraction = config.initial_fraction,
        seed,
        "starting SIS ensemble"
    );

    let meta = OutputMetadata::new(&graph, &config);
    let normalization = if args.quasi_stationary {
        Normalization::Surviving
    } else {
        Normalization::AllSamples
    };

    let ensemble = if args.parallel {
        let ensemble = run_ensemble_parallel(&graph, &config, seed)?;
        write_prevalence_file(&args.output, &meta, &ensemble.points(normalization))?;
        ensemble
    } else {
        run_ensemble(&graph, &config, seed, |_, ensemble| {
            write_prevalence_file(&args.output, &meta, &ensemble.points(normalization))
        })?
    };

    info!(
        output = %args.output.display(),
        samples = ensemble.realizations(),
        bins = ensemble.deepest_bin(),
        "done"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("dynsis").chain(argv.iter().copied()))
    }

    #[test]
    fn test_missing_graph_source_is_usage_error() {
        let err = parse(&["out.dat", "--samples", "1", "--lambda", "0.5"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_ne!(err.exit_code(), 0);
        assert!(err.to_string().contains("--edges"));
    }

    #[test]
    fn test_edges_conflicts_with_karate() {
        let err = parse(&["out.dat", "--karate", "--edges", "g.csv"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_missing_lambda_after_merge_is_usage_error() {
        let args = parse(&[
            "out.dat",
            "--karate",
            "--samples",
            "1",
            "--t-max",
            "5",
            "--initial-fraction",
            "1.0",
        ])
        .unwrap();
        let err = simulation_config(&args, &RunConfig::default()).unwrap_err();
        let usage = err.downcast::<clap::Error>().unwrap();
        assert_eq!(usage.kind(), ErrorKind::MissingRequiredArgument);
        assert_ne!(usage.exit_code(), 0);
        assert!(usage.to_string().contains("--lambda"));
    }

    #[test]
    fn test_run_file_fills_unset_flags() {
        let args = parse(&["out.dat", "--karate", "--samples", "3"]).unwrap();
        let file = RunConfig {
            seed: Some(7),
            simulation: SimulationSection {
                samples: Some(100),
                lambda: Some(0.25),
                t_max: Some(50),
                initial_fraction: Some(0.5),
                max_rejection_draws: None,
            },
        };
        let config = simulation_config(&args, &file).unwrap();
        assert_eq!(config.samples, 3);
        assert_eq!(config.lambda, 0.25);
        assert_eq!(config.t_max, 50);
        assert_eq!(config.max_rejection_draws, SimulationConfig::default().max_rejection_draws);
    }

    #[test]
    fn test_invalid_parameter_is_not_usage_error() {
        let args = parse(&[
            "out.dat",
            "--karate",
            "--samples",
            "1",
            "--lambda=-1",
            "--t-max",
            "5",
            "--initial-fraction",
            "1.0",
        ])
        .unwrap();
        let err = simulation_config(&args, &RunConfig::default()).unwrap_err();
        assert!(err.downcast_ref::<clap::Error>().is_none());
        assert!(err.downcast_ref::<dynsis::SisError>().is_some());
    }
}
