//! Static contact network.
//!
//! Nodes carry arbitrary integer labels but are stored under dense indices
//! `0..n_nodes`, assigned in first-seen order; the labels themselves are not
//! kept. The adjacency is immutable once built, and the maximum degree is
//! computed from it so it can serve as the exact upper bound for
//! degree-proportional rejection sampling.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, SisError};

#[derive(Debug, Clone)]
pub struct StaticGraph {
    adjacency: Vec<Vec<usize>>,
    n_edges: usize,
    max_degree: usize,
}

impl StaticGraph {
    /// Build a simple graph from an edge iterator.
    ///
    /// Duplicate edges collapse into one and self-loops are skipped.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (i64, i64)>,
    {
        Self::from_parts(std::iter::empty(), edges)
    }

    /// Build a graph from explicit node labels plus edges.
    ///
    /// Labels listed in `nodes` exist even when no edge touches them, which is
    /// the only way to get isolated vertices into the graph.
    pub fn from_parts<N, I>(nodes: N, edges: I) -> Self
    where
        N: IntoIterator<Item = i64>,
        I: IntoIterator<Item = (i64, i64)>,
    {
        let mut index_of: HashMap<i64, usize> = HashMap::new();
        let mut adjacency: Vec<Vec<usize>> = Vec::new();

        let mut intern = |label: i64, adjacency: &mut Vec<Vec<usize>>| {
            *index_of.entry(label).or_insert_with(|| {
                adjacency.push(Vec::new());
                adjacency.len() - 1
            })
        };

        for label in nodes {
            intern(label, &mut adjacency);
        }

        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut n_edges = 0;
        for (a, b) in edges {
            let u = intern(a, &mut adjacency);
            let v = intern(b, &mut adjacency);
            if u == v {
                warn!(node = a, "skipping self-loop");
                continue;
            }
            if !seen.insert((u.min(v), u.max(v))) {
                warn!(a, b, "skipping duplicate edge");
                continue;
            }
            adjacency[u].push(v);
            adjacency[v].push(u);
            n_edges += 1;
        }

        let max_degree = adjacency.iter().map(Vec::len).max().unwrap_or(0);

        Self {
            adjacency,
            n_edges,
            max_degree,
        }
    }

    /// Parse a comma-separated edge list, one `a,b` pair per line.
    ///
    /// Blank lines are ignored and tokens past the second are ignored. Any
    /// other malformed line fails the whole ingestion.
    pub fn from_edge_list<R: BufRead>(reader: R) -> Result<Self> {
        let mut edges = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|source| SisError::io("<edge list>", source))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            edges.push(parse_edge(trimmed, line_no)?);
        }
        Ok(Self::from_edges(edges))
    }

    /// Read an edge list file from disk.
    pub fn from_edge_list_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| SisError::io(path, source))?;
        let graph = Self::from_edge_list(BufReader::new(file)).map_err(|err| match err {
            SisError::Io { source, .. } => SisError::io(path, source),
            other => other,
        })?;
        debug!(
            path = %path.display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            kmax = graph.max_degree(),
            "loaded edge list"
        );
        Ok(graph)
    }

    /// Zachary's karate club network (34 nodes, 78 edges).
    pub fn karate_club() -> Self {
        let edges = KARATE_CLUB
            .iter()
            .flat_map(|(u, targets)| targets.iter().map(move |v| (*u, *v)));
        Self::from_parts(0..34, edges)
    }

    /// Number of nodes, isolated ones included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.n_edges
    }

    /// Degree of dense node `v`.
    #[inline]
    pub fn degree(&self, v: usize) -> usize {
        self.adjacency[v].len()
    }

    /// Dense indices adjacent to `v`, in insertion order.
    #[inline]
    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.adjacency[v]
    }

    /// Exact maximum degree over all nodes.
    #[inline]
    pub fn max_degree(&self) -> usize {
        self.max_degree
    }
}

fn parse_edge(line: &str, line_no: usize) -> Result<(i64, i64)> {
    let mut tokens = line.split(',').map(str::trim);
    let (Some(a), Some(b)) = (tokens.next(), tokens.next()) else {
        return Err(SisError::MalformedInput {
            line: line_no,
            reason: format!("expected two comma-separated endpoints, got {line:?}"),
        });
    };
    let parse = |token: &str| {
        token.parse::<i64>().map_err(|_| SisError::MalformedInput {
            line: line_no,
            reason: format!("endpoint {token:?} is not an integer"),
        })
    };
    Ok((parse(a)?, parse(b)?))
}

const KARATE_CLUB: &[(i64, &[i64])] = &[
    (0, &[1, 2, 3, 4, 5, 6, 7, 8, 10, 11, 12, 13, 17, 19, 21, 31]),
    (1, &[2, 3, 7, 13, 17, 19, 21, 30]),
    (2, &[3, 7, 8, 9, 13, 27, 28, 32]),
    (3, &[7, 12, 13]),
    (4, &[6, 10]),
    (5, &[6, 10, 16]),
    (6, &[16]),
    (8, &[30, 32, 33]),
    (9, &[33]),
    (13, &[33]),
    (14, &[32, 33]),
    (15, &[32, 33]),
    (18, &[32, 33]),
    (19, &[33]),
    (20, &[32, 33]),
    (22, &[32, 33]),
    (23, &[25, 27, 29, 32, 33]),
    (24, &[25, 27, 31]),
    (25, &[31]),
    (26, &[29, 33]),
    (27, &[33]),
    (28, &[31, 33]),
    (29, &[32, 33]),
    (30, &[32, 33]),
    (31, &[32, 33]),
    (32, &[33]),
];
