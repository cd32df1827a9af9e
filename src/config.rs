//! Run configuration loaded from TOML.
//!
//! ```toml
//! customers = 1000
//! workflows = ["onboarding", "renewal"]
//! catalog = "catalog.json"
//! seed = 42
//!
//! [[experiments]]
//! strategy = "s1"
//! disobedience = 30
//!
//! [[experiments]]
//! disobedience = 0
//!
//! [output]
//! dir = "reports"
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use journeysim_core::{Disobedience, Error as CoreError};
use journeysim_orchestrator::{ExperimentArm, ExperimentPlan, SimulationSettings, StrategyMiss};

const DEFAULT_CUSTOMERS: u64 = 1000;
const DEFAULT_OUTPUT_DIR: &str = "reports";

/// Why a run configuration was rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] CoreError),

    #[error("customers must be at least 1")]
    ZeroCustomers,

    #[error("at least one workflow is required")]
    NoWorkflows,

    #[error("at least one experiment is required")]
    NoExperiments,

    #[error("experiment #{index}: disobedience must be within 0..=100, got {value}")]
    InvalidProbability { index: usize, value: u32 },

    #[error("output cannot be both a directory and stdout")]
    ConflictingOutput,
}

/// One (strategy, disobedience) pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentEntry {
    /// Strategy name; absent means permissive.
    #[serde(default)]
    pub strategy: Option<String>,
    pub disobedience: u32,
}

/// Where reports go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub stdout: bool,
}

/// Resolved report destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Directory(PathBuf),
    Stdout,
}

impl OutputConfig {
    #[must_use]
    pub fn target(&self) -> OutputTarget {
        if self.stdout {
            OutputTarget::Stdout
        } else {
            OutputTarget::Directory(
                self.dir
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            )
        }
    }
}

/// Complete description of a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default = "default_customers")]
    pub customers: u64,
    #[serde(default = "default_start_state")]
    pub start_state: String,
    pub workflows: Vec<String>,
    pub experiments: Vec<ExperimentEntry>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub call_timeout_ms: Option<u64>,
    pub catalog: PathBuf,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub strategy_miss: StrategyMiss,
    #[serde(default)]
    pub api_addr: Option<SocketAddr>,
}

const fn default_customers() -> u64 {
    DEFAULT_CUSTOMERS
}

fn default_start_state() -> String {
    "start".to_string()
}

impl RunConfig {
    /// Load a run file. A relative `catalog` path is resolved against the
    /// directory of the run file.
    ///
    /// # Errors
    ///
    /// Returns `FileReadFailed` or `TomlParseFailed`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::file_read_failed(path, e.to_string()))?;
        let mut config = Self::parse(&text)?;

        if config.catalog.is_relative() {
            if let Some(parent) = path.parent() {
                config.catalog = parent.join(&config.catalog);
            }
        }
        tracing::debug!(path = %path.display(), "Loaded run configuration");
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `TomlParseFailed` for invalid TOML or unknown fields.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| CoreError::toml_parse_failed(e.to_string()).into())
    }

    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.customers == 0 {
            return Err(ConfigError::ZeroCustomers);
        }
        if self.workflows.is_empty() {
            return Err(ConfigError::NoWorkflows);
        }
        if self.experiments.is_empty() {
            return Err(ConfigError::NoExperiments);
        }
        if self.output.stdout && self.output.dir.is_some() {
            return Err(ConfigError::ConflictingOutput);
        }
        self.arms().map(|_| ())
    }

    fn arms(&self) -> Result<Vec<ExperimentArm>, ConfigError> {
        self.experiments
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                Disobedience::new(entry.disobedience)
                    .map(|p| ExperimentArm::new(entry.strategy.clone(), p))
                    .map_err(|_| ConfigError::InvalidProbability {
                        index,
                        value: entry.disobedience,
                    })
            })
            .collect()
    }

    /// # Errors
    ///
    /// Returns the same errors as [`RunConfig::validate`].
    pub fn to_plan(&self) -> Result<ExperimentPlan, ConfigError> {
        self.validate()?;
        Ok(ExperimentPlan::new(
            &self.workflows,
            &self.arms()?,
            self.customers,
        ))
    }

    #[must_use]
    pub fn settings(&self) -> SimulationSettings {
        SimulationSettings {
            start_state: self.start_state.clone(),
            call_timeout: self.call_timeout_ms.map(Duration::from_millis),
            strategy_miss: self.strategy_miss,
            seed: self.seed,
        }
    }
}
