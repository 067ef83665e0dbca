//! Time-series output file.
//!
//! A `#`-prefixed metadata header followed by one `<mean time> <mean
//! prevalence>` line per populated bin. The file is rewritten in full after
//! each realization, through a temporary sibling and a rename, so a reader
//! never sees a half-written table.
//!
//! Floats are rendered as Python's `repr` would, so tables from either
//! implementation diff cleanly.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::epidemic::{PrevalencePoint, SimulationConfig};
use crate::error::{Result, SisError};
use crate::graph::StaticGraph;

/// Run description written in the header.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputMetadata {
    pub n_nodes: usize,
    /// Undirected edge count; the header reports twice this value.
    pub n_edges: usize,
    pub samples: u64,
    pub lambda: f64,
    pub t_max: u32,
    pub initial_fraction: f64,
}

impl OutputMetadata {
    /// Describe a run of `config` on `graph`.
    pub fn new(graph: &StaticGraph, config: &SimulationConfig) -> Self {
        Self {
            n_nodes: graph.node_count(),
            n_edges: graph.edge_count(),
            samples: config.samples,
            lambda: config.lambda,
            t_max: config.t_max,
            initial_fraction: config.initial_fraction,
        }
    }
}

/// Write the header and one row per point to `out`, then flush.
pub fn write_prevalence<W: Write>(
    mut out: W,
    meta: &OutputMetadata,
    points: &[PrevalencePoint],
) -> io::Result<()> {
    writeln!(
        out,
        "## ***** Algorithm used: Optimized Gillespie Algorithm for SIS (SIS-OGA, Rust) *****"
    )?;
    writeln!(out, "#@ Number of nodes: {}", meta.n_nodes)?;
    writeln!(out, "#@ Number of edges: {}", 2 * meta.n_edges)?;
    writeln!(out, "#@ Samples: {}", meta.samples)?;
    writeln!(out, "#! Infection rate (lambda): {}", format_float(meta.lambda))?;
    writeln!(out, "#! Maximum time steps: {}", meta.t_max)?;
    writeln!(
        out,
        "#! Fraction of infected vertices (initial condition): {}",
        format_float(meta.initial_fraction)
    )?;
    for point in points {
        writeln!(
            out,
            "{} {}",
            format_float(point.time),
            format_float(point.prevalence)
        )?;
    }
    out.flush()
}

/// Shortest round-trip form with Python's exponent style (`1e-05`, `1e+16`).
///
/// `{:?}` already switches to scientific notation at the same magnitudes as
/// Python; only the exponent needs an explicit sign and two digits.
fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    let repr = format!("{x:?}");
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => repr,
    }
}

/// Replace `path` with a freshly written table.
pub fn write_prevalence_file(
    path: &Path,
    meta: &OutputMetadata,
    points: &[PrevalencePoint],
) -> Result<()> {
    let tmp = temp_sibling(path);
    let file = File::create(&tmp).map_err(|source| SisError::io(&tmp, source))?;
    write_prevalence(BufWriter::new(file), meta, points)
        .map_err(|source| SisError::io(&tmp, source))?;
    fs::rename(&tmp, path).map_err(|source| SisError::io(path, source))
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn meta() -> OutputMetadata {
        OutputMetadata {
            n_nodes: 4,
            n_edges: 4,
            samples: 10,
            lambda: 0.5,
            t_max: 5,
            initial_fraction: 1.0,
        }
    }

    #[test]
    fn test_header_and_rows() {
        let points = [
            PrevalencePoint { time: 1.5, prevalence: 0.75 },
            PrevalencePoint { time: 2.25, prevalence: 0.5 },
        ];
        let mut buf = Vec::new();
        write_prevalence(&mut buf, &meta(), &points).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let expected = "\
## ***** Algorithm used: Optimized Gillespie Algorithm for SIS (SIS-OGA, Rust) *****
#@ Number of nodes: 4
#@ Number of edges: 8
#@ Samples: 10
#! Infection rate (lambda): 0.5
#! Maximum time steps: 5
#! Fraction of infected vertices (initial condition): 1.0
1.5 0.75
2.25 0.5
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_python_float_format() {
        let cases = [
            (1.0, "1.0"),
            (0.5, "0.5"),
            (123.25, "123.25"),
            (0.0001, "0.0001"),
            (1e-5, "1e-05"),
            (1.5e-7, "1.5e-07"),
            (2.5e-123, "2.5e-123"),
            (1e16, "1e+16"),
            (1.25e20, "1.25e+20"),
            (1e300, "1e+300"),
            (-3e-6, "-3e-06"),
            (f64::INFINITY, "inf"),
            (f64::NAN, "nan"),
        ];
        for (x, expected) in cases {
            assert_eq!(format_float(x), expected, "formatting {x:?}");
        }
    }

    #[test]
    fn test_small_values_use_python_exponents_in_table() {
        let meta = OutputMetadata { lambda: 1e-5, ..meta() };
        let points = [PrevalencePoint { time: 1.0, prevalence: 2.5e-6 }];
        let mut buf = Vec::new();
        write_prevalence(&mut buf, &meta, &points).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("#! Infection rate (lambda): 1e-05\n"));
        assert!(text.ends_with("1.0 2.5e-06\n"));
    }

    #[test]
    fn test_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sis.dat");
        write_prevalence_file(&path, &meta(), &[PrevalencePoint { time: 1.0, prevalence: 1.0 }])
            .unwrap();
        write_prevalence_file(&path, &meta(), &[]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 7);
        assert!(text.lines().all(|l| l.starts_with('#')));
        assert!(!dir.path().join("sis.dat.tmp").exists());
    }
}
