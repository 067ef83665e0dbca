//! Error taxonomy for graph ingestion, configuration and simulation.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SisError>;

#[derive(Debug, Error)]
pub enum SisError {
    /// Edge list line that does not hold two integer endpoints.
    #[error("malformed edge list at line {line}: {reason}")]
    MalformedInput { line: usize, reason: String },
    #[error("unable to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// A precondition of the rejection sampler does not hold.
    #[error("precondition violated: {0}")]
    PrecondAborted(String),
    #[error("failed to parse run config {path}: {details}")]
    Config { path: PathBuf, details: String },
}

impl SisError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SisError::Io {
            path: path.into(),
            source,
        }
    }
}
