//! Run configuration file.
//!
//! ```toml
//! seed = 7
//!
//! [simulation]
//! samples = 100
//! lambda = 0.3
//! t-max = 500
//! initial-fraction = 1.0
//! ```
//!
//! Every field is optional; command-line flags take precedence.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::epidemic::SimulationConfig;
use crate::error::{Result, SisError};

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RunConfig {
    pub seed: Option<u64>,
    #[serde(default)]
    pub simulation: SimulationSection,
}

/// Partially specified simulation parameters.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SimulationSection {
    pub samples: Option<u64>,
    pub lambda: Option<f64>,
    pub t_max: Option<u32>,
    pub initial_fraction: Option<f64>,
    pub max_rejection_draws: Option<u64>,
}

impl SimulationSection {
    /// Fill unset fields from `fallback`.
    pub fn or(self, fallback: SimulationSection) -> Self {
        Self {
            samples: self.samples.or(fallback.samples),
            lambda: self.lambda.or(fallback.lambda),
            t_max: self.t_max.or(fallback.t_max),
            initial_fraction: self.initial_fraction.or(fallback.initial_fraction),
            max_rejection_draws: self.max_rejection_draws.or(fallback.max_rejection_draws),
        }
    }

    /// Names of required parameters that are still unset.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.samples.is_none() {
            missing.push("samples");
        }
        if self.lambda.is_none() {
            missing.push("lambda");
        }
        if self.t_max.is_none() {
            missing.push("t-max");
        }
        if self.initial_fraction.is_none() {
            missing.push("initial-fraction");
        }
        missing
    }

    /// Complete, validated config. `None` when a required field is unset.
    pub fn resolve(&self) -> Option<Result<SimulationConfig>> {
        let config = SimulationConfig {
            samples: self.samples?,
            lambda: self.lambda?,
            t_max: self.t_max?,
            initial_fraction: self.initial_fraction?,
            max_rejection_draws: self
                .max_rejection_draws
                .unwrap_or(SimulationConfig::default().max_rejection_draws),
        };
        Some(config.validate().map(|()| config))
    }
}

impl RunConfig {
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        toml::from_str(contents).map_err(|err| SisError::Config {
            path: path.to_path_buf(),
            details: err.to_string(),
        })
    }
}

pub fn load_run_config(path: &Path) -> Result<RunConfig> {
    let contents = fs::read_to_string(path).map_err(|source| SisError::io(path, source))?;
    RunConfig::parse(&contents, path)
}
