//! Experiment runner.
//!
//! An [`ExperimentPlan`] expands workflow variants × (strategy,
//! disobedience) pairs into configurations. [`Simulation::run_plan`] runs
//! them one after another; within a configuration every customer runs
//! concurrently and the runner resumes only once all of them finished.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::try_join_all;
use itertools::Itertools;
use ractor::ActorRef;
use ractor::concurrency::JoinHandle;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use journeysim_core::{CatalogSource, Disobedience, ResultExt, RuleCatalog, load_catalog};

use crate::actors::{
    CompanyArguments, CompanyMessage, CustomerArguments, CustomerMessage, CustomerOutcome,
    CustomerSnapshot, ProviderMessage, request, spawn_company, spawn_customer, spawn_provider,
};
use crate::aggregation::AggregationByEndState;
use crate::error::{SimulationError, SimulationResult};
use crate::provider::{StrategyMiss, WorkflowProvider};
use crate::registry::CustomerRegistry;
use crate::report::{CustomerReportRow, ReportSink, SummaryReportRow};
use crate::rng::{RandomSource, SharedRng};

/// Label used in place of a strategy name for permissive configurations.
pub const PERMISSIVE_LABEL: &str = "permissive";

/// One (strategy, disobedience) pair of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentArm {
    pub strategy: Option<String>,
    pub disobedience: Disobedience,
}

impl ExperimentArm {
    pub fn new(strategy: Option<impl Into<String>>, disobedience: Disobedience) -> Self {
        Self {
            strategy: strategy.map(Into::into),
            disobedience,
        }
    }
}

/// A single simulated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentConfig {
    pub workflow: String,
    pub strategy: Option<String>,
    pub disobedience: Disobedience,
    pub customers: u64,
}

impl ExperimentConfig {
    /// `"{workflow}/{strategy|permissive}/p{n}"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}/{}/p{}",
            self.workflow,
            self.strategy_label(),
            self.disobedience
        )
    }

    #[must_use]
    pub fn strategy_label(&self) -> &str {
        self.strategy.as_deref().unwrap_or(PERMISSIVE_LABEL)
    }
}

/// Ordered list of configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExperimentPlan {
    configurations: Vec<ExperimentConfig>,
}

impl ExperimentPlan {
    /// Every workflow crossed with every arm, workflow-major.
    #[must_use]
    pub fn new(workflows: &[String], arms: &[ExperimentArm], customers: u64) -> Self {
        let configurations = workflows
            .iter()
            .cartesian_product(arms)
            .map(|(workflow, arm)| ExperimentConfig {
                workflow: workflow.clone(),
                strategy: arm.strategy.clone(),
                disobedience: arm.disobedience,
                customers,
            })
            .collect();
        Self { configurations }
    }

    #[must_use]
    pub fn configurations(&self) -> &[ExperimentConfig] {
        &self.configurations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }
}

/// Parameters shared by every configuration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSettings {
    pub start_state: String,
    /// Timeout for each actor call; `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
    pub strategy_miss: StrategyMiss,
    pub seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            start_state: "start".to_string(),
            call_timeout: None,
            strategy_miss: StrategyMiss::default(),
            seed: None,
        }
    }
}

/// Result of one configuration.
#[derive(Debug, Clone)]
pub struct ExperimentRun {
    pub label: String,
    /// Terminal outcomes ordered by customer id.
    pub outcomes: Vec<CustomerOutcome>,
    pub aggregation: AggregationByEndState,
    pub elapsed: Duration,
}

/// A configuration that was aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedConfiguration {
    pub label: String,
    pub reason: String,
}

/// What happened to each configuration of a plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub run_id: Uuid,
    pub completed: Vec<String>,
    pub failed: Vec<FailedConfiguration>,
}

impl PlanReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

type Spawned = (ActorRef<CustomerMessage>, JoinHandle<()>);

/// Drives configurations through the actor system.
pub struct Simulation {
    settings: SimulationSettings,
    rng: Arc<dyn RandomSource>,
    registry: Option<Arc<CustomerRegistry>>,
}

impl Simulation {
    /// A simulation drawing from a [`SharedRng`] seeded from `settings.seed`.
    #[must_use]
    pub fn new(settings: SimulationSettings) -> Self {
        let rng: Arc<dyn RandomSource> = Arc::new(SharedRng::from_seed_option(settings.seed));
        Self {
            settings,
            rng,
            registry: None,
        }
    }

    #[must_use]
    pub fn with_rng(mut self, rng: Arc<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    /// Publish customers to `registry` while they run and after they finish.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<CustomerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub const fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Run `customers` journeys with ids `1..=customers` against an already
    /// running provider and company, and fold their outcomes.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Actor`] if a customer cannot be spawned or
    /// fails before finishing. All customers of the run are stopped first and
    /// removed from the registry.
    pub async fn run_experiment(
        &self,
        label: &str,
        customers: u64,
        provider: &ActorRef<ProviderMessage>,
        company: &ActorRef<CompanyMessage>,
        disobedience: Disobedience,
    ) -> SimulationResult<ExperimentRun> {
        let started = Instant::now();
        let mut spawned: Vec<Spawned> =
            Vec::with_capacity(usize::try_from(customers).unwrap_or_default());

        for id in 1..=customers {
            let args = CustomerArguments {
                id,
                start_state: self.settings.start_state.clone(),
                disobedience,
                provider: provider.clone(),
                company: company.clone(),
                rng: Arc::clone(&self.rng),
                call_timeout: self.settings.call_timeout,
            };
            match spawn_customer(args).await {
                Ok((actor, handle)) => {
                    if let Some(registry) = &self.registry {
                        registry.register_live(label, id, actor.clone());
                    }
                    spawned.push((actor, handle));
                }
                Err(e) => {
                    self.abort(label, spawned).await;
                    return Err(e.into());
                }
            }
        }

        let waits = spawned.iter().map(|(actor, _)| {
            request(actor, None, |reply| CustomerMessage::AwaitOutcome { reply })
        });
        let joined = try_join_all(waits).await;
        let outcomes = match joined {
            Ok(outcomes) => outcomes,
            Err(e) => {
                self.abort(label, spawned).await;
                return Err(e.into());
            }
        };

        if let Some(registry) = &self.registry {
            for outcome in &outcomes {
                registry.record_finished(label, CustomerSnapshot::from(outcome));
            }
        }
        stop_all(spawned).await;

        let aggregation = AggregationByEndState::from_outcomes(&outcomes);
        let elapsed = started.elapsed();
        info!(
            experiment = label,
            customers,
            end_states = aggregation.len(),
            elapsed_ms = elapsed.as_millis(),
            "Experiment finished"
        );

        Ok(ExperimentRun {
            label: label.to_string(),
            outcomes,
            aggregation,
            elapsed,
        })
    }

    async fn abort(&self, label: &str, spawned: Vec<Spawned>) {
        stop_all(spawned).await;
        if let Some(registry) = &self.registry {
            registry.forget_experiment(label);
        }
    }

    /// Resolve the provider for `config`, start provider and company, run the
    /// customers, then stop both.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Config`] for an unknown strategy before any
    /// actor is spawned, and [`SimulationError::Actor`] for runtime failures.
    pub async fn run_configuration(
        &self,
        source: &dyn CatalogSource,
        catalog: Arc<RuleCatalog>,
        config: &ExperimentConfig,
    ) -> SimulationResult<ExperimentRun> {
        let provider = WorkflowProvider::resolve(
            source,
            catalog,
            config.strategy.as_deref(),
            self.settings.strategy_miss,
        )
        .await?;

        let (provider_ref, provider_handle) = spawn_provider(provider).await?;
        let company_args = CompanyArguments::new(provider_ref.clone(), Arc::clone(&self.rng))
            .with_call_timeout(self.settings.call_timeout);
        let (company_ref, company_handle) = match spawn_company(company_args).await {
            Ok(spawned) => spawned,
            Err(e) => {
                provider_ref.stop(None);
                let _ = provider_handle.await;
                return Err(e.into());
            }
        };

        let result = self
            .run_experiment(
                &config.label(),
                config.customers,
                &provider_ref,
                &company_ref,
                config.disobedience,
            )
            .await;

        company_ref.stop(None);
        provider_ref.stop(None);
        let _ = company_handle.await;
        let _ = provider_handle.await;

        result
    }

    /// Run every configuration of `plan`, writing customer tables as each
    /// configuration completes and the summary at the end.
    ///
    /// A configuration that fails is logged, recorded in the returned report
    /// and skipped; the others still run.
    ///
    /// # Errors
    ///
    /// Returns an error only when the sink cannot be written.
    pub async fn run_plan(
        &self,
        source: &dyn CatalogSource,
        plan: &ExperimentPlan,
        sink: &mut dyn ReportSink,
    ) -> SimulationResult<PlanReport> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!(%run_id, configurations = plan.len(), "Starting simulation run");

        let mut catalogs: HashMap<String, Arc<RuleCatalog>> = HashMap::new();
        let mut summary: Vec<SummaryReportRow> = Vec::new();
        let mut completed = Vec::new();
        let mut failed = Vec::new();

        for config in plan.configurations() {
            let label = config.label();
            info!(experiment = %label, customers = config.customers, "Starting configuration");

            let result = match catalog_for(source, &config.workflow, &mut catalogs).await {
                Ok(catalog) => self.run_configuration(source, catalog, config).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(run) => {
                    let rows: Vec<CustomerReportRow> = run
                        .outcomes
                        .iter()
                        .map(|o| CustomerReportRow::from_outcome(config, o))
                        .collect();
                    sink.write_customers(config, &rows)?;
                    summary.extend(SummaryReportRow::from_aggregation(config, &run.aggregation));
                    completed.push(label);
                }
                Err(e) => {
                    if e.is_configuration() {
                        warn!(experiment = %label, error = %e, "Configuration rejected");
                    } else {
                        error!(experiment = %label, error = %e, "Configuration aborted");
                    }
                    failed.push(FailedConfiguration {
                        label,
                        reason: e.to_string(),
                    });
                }
            }
        }

        sink.write_summary(&summary)?;
        info!(
            %run_id,
            completed = completed.len(),
            failed = failed.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Simulation run finished"
        );

        Ok(PlanReport {
            run_id,
            completed,
            failed,
        })
    }
}

/// Catalogs are loaded once per workflow and shared by its configurations.
async fn catalog_for(
    source: &dyn CatalogSource,
    workflow: &str,
    cache: &mut HashMap<String, Arc<RuleCatalog>>,
) -> SimulationResult<Arc<RuleCatalog>> {
    if let Some(catalog) = cache.get(workflow) {
        return Ok(Arc::clone(catalog));
    }
    let catalog = Arc::new(
        load_catalog(source, workflow)
            .await
            .inspect_error(|e| debug!(workflow, error = %e, "Catalog not loaded"))
            .map_err(SimulationError::from)?,
    );
    cache.insert(workflow.to_string(), Arc::clone(&catalog));
    Ok(catalog)
}

async fn stop_all(spawned: Vec<Spawned>) {
    let handles: Vec<JoinHandle<()>> = spawned
        .into_iter()
        .map(|(actor, handle)| {
            actor.stop(None);
            handle
        })
        .collect();
    for handle in handles {
        let _ = handle.await;
    }
}
