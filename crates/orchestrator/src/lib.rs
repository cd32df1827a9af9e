//! # Orchestrator
//!
//! Actor-driven simulation of customer journeys: the provider, company and
//! customer actors, the experiment runner, result aggregation, report sinks
//! and the live query API.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]

pub use journeysim_core::{Error, Result};

/// Actors and the request/reply helper they communicate through
pub mod actors;

/// Aggregation of terminal outcomes per end state
pub mod aggregation;

/// HTTP query surface over the live registry
pub mod api;

pub mod error;

/// Experiment plans and the runner that executes them
pub mod experiment;

/// Workflow provider policy (permissive or strategy-filtered)
pub mod provider;

pub mod registry;

/// Report rows and sinks
pub mod report;

/// Injectable random sources
pub mod rng;

pub use aggregation::{AggregationByEndState, AggregationEntry, EndStateSummary};
pub use error::{SimulationError, SimulationResult};
pub use experiment::{
    ExperimentArm, ExperimentConfig, ExperimentPlan, ExperimentRun, FailedConfiguration,
    PlanReport, Simulation, SimulationSettings,
};
pub use provider::{StrategyMiss, WorkflowProvider};
pub use registry::CustomerRegistry;
pub use report::{
    BundleSink, CsvDirectorySink, CustomerReportRow, MemorySink, ReportSink, SummaryReportRow,
};
pub use rng::{RandomSource, ScriptedRandom, SharedRng};
