//! CLI command handlers.
//!
//! All commands follow functional patterns:
//! - Zero unwraps, zero panics
//! - `anyhow::Result` with context at this boundary only

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use journeysim_core::{CatalogSource, JsonCatalogSource, load_catalog, load_strategy};
use journeysim_orchestrator::{
    BundleSink, CsvDirectorySink, CustomerRegistry, PlanReport, Simulation, api,
};

use crate::cli::{Commands, RunArgs};
use crate::config::{OutputConfig, OutputTarget, RunConfig};

/// Execute a CLI command.
///
/// This is the main command dispatcher that routes to the appropriate handler.
pub async fn execute_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run(args) => cmd_run(args).await,
        Commands::Validate { config } => cmd_validate(&config).await,
        Commands::Strategies { catalog } => cmd_strategies(&catalog).await,
    }
}

/// Fold command-line overrides into the loaded configuration.
pub fn apply_overrides(config: &mut RunConfig, args: &RunArgs) {
    if let Some(customers) = args.customers {
        config.customers = customers;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(catalog) = &args.catalog {
        config.catalog.clone_from(catalog);
    }
    if let Some(dir) = &args.out {
        config.output = OutputConfig {
            dir: Some(dir.clone()),
            stdout: false,
        };
    }
    if args.stdout {
        config.output = OutputConfig {
            dir: None,
            stdout: true,
        };
    }
    if let Some(addr) = args.serve {
        config.api_addr = Some(addr);
    }
}

/// Run every configuration of the plan.
async fn cmd_run(args: RunArgs) -> Result<()> {
    let mut config = RunConfig::load(&args.config)
        .with_context(|| format!("Failed to load run file {}", args.config.display()))?;
    apply_overrides(&mut config, &args);
    let plan = config.to_plan().context("Invalid run configuration")?;

    let source = JsonCatalogSource::open(&config.catalog)
        .with_context(|| format!("Failed to open catalog {}", config.catalog.display()))?;

    let mut simulation = Simulation::new(config.settings());
    let api_server = match config.api_addr {
        Some(addr) => {
            let registry = Arc::new(CustomerRegistry::new());
            simulation = simulation.with_registry(Arc::clone(&registry));
            Some(ApiServer::start(addr, registry).await?)
        }
        None => None,
    };

    let outcome = match config.output.target() {
        OutputTarget::Directory(dir) => {
            let mut sink = CsvDirectorySink::create(&dir)
                .with_context(|| format!("Failed to prepare report directory {}", dir.display()))?;
            simulation.run_plan(&source, &plan, &mut sink).await
        }
        OutputTarget::Stdout => {
            let mut sink = BundleSink::new(std::io::stdout());
            simulation.run_plan(&source, &plan, &mut sink).await
        }
    };

    if let Some(server) = api_server {
        server.stop().await;
    }

    let report = outcome.context("Failed to write reports")?;
    summarize(&report)
}

fn summarize(report: &PlanReport) -> Result<()> {
    info!(
        run_id = %report.run_id,
        completed = report.completed.len(),
        failed = report.failed.len(),
        "Run complete"
    );
    for failure in &report.failed {
        warn!(experiment = %failure.label, reason = %failure.reason, "Configuration skipped");
    }
    if report.is_success() {
        Ok(())
    } else {
        bail!(
            "{} of {} configurations failed",
            report.failed.len(),
            report.failed.len() + report.completed.len()
        )
    }
}

/// Load a run file and check it against its catalog without simulating.
///
/// Every requested workflow and strategy is checked; all problems are
/// reported together.
async fn cmd_validate(path: &Path) -> Result<()> {
    let config = RunConfig::load(path)
        .with_context(|| format!("Failed to load run file {}", path.display()))?;
    let plan = config.to_plan().context("Invalid run configuration")?;

    let source = JsonCatalogSource::open(&config.catalog)
        .with_context(|| format!("Failed to open catalog {}", config.catalog.display()))?;
    println!(
        "catalog {}: workflows {}",
        config.catalog.display(),
        source.workflow_names().join(", ")
    );

    let mut problems = Vec::new();
    for workflow in &config.workflows {
        match load_catalog(&source, workflow).await {
            Ok(catalog) => println!(
                "workflow {workflow}: {} tasks from {} states",
                catalog.len(),
                catalog.origin_states().count()
            ),
            Err(e) => problems.push(e.to_string()),
        }
    }

    let strategies: BTreeSet<&str> = config
        .experiments
        .iter()
        .filter_map(|e| e.strategy.as_deref())
        .collect();
    for name in strategies {
        match load_strategy(&source, name).await {
            Ok(table) => println!("strategy {name}: entries for {} states", table.state_count()),
            Err(e) => problems.push(e.to_string()),
        }
    }

    if !problems.is_empty() {
        bail!("{} problem(s): {}", problems.len(), problems.join("; "));
    }

    println!(
        "{}: OK ({} configurations, {} customers each)",
        path.display(),
        plan.len(),
        config.customers
    );
    Ok(())
}

/// List the strategy names of a catalog.
async fn cmd_strategies(path: &Path) -> Result<()> {
    let source = JsonCatalogSource::open(path)
        .with_context(|| format!("Failed to open catalog {}", path.display()))?;
    source
        .strategy_names()
        .await?
        .iter()
        .for_each(|name| println!("{name}"));
    Ok(())
}

/// The live query API running in the background for the length of a run.
struct ApiServer {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl ApiServer {
    async fn start(addr: SocketAddr, registry: Arc<CustomerRegistry>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind query API on {addr}"))?;
        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(api::serve(listener, registry, async move {
            let _ = signal.await;
        }));
        Ok(Self { shutdown, task })
    }

    async fn stop(self) {
        let _ = self.shutdown.send(());
        match self.task.await {
            Ok(Ok(())) => info!("Query API stopped"),
            Ok(Err(e)) => warn!(error = %e, "Query API failed"),
            Err(e) => warn!(error = %e, "Query API task panicked"),
        }
    }
}
