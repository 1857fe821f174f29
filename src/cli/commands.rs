//! CLI command implementations
//!
//! Every command follows the same boot sequence:
//!
//! 1. Configuration load and validation
//! 2. Logging initialization
//! 3. Component wiring (store, checkpoint backend, filters, graph sink)
//! 4. Command execution, one JSON response on stdout

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::checkpoint::{CheckpointManager, LocalCheckpointStore};
use crate::config::ServiceConfig;
use crate::filter::FilterCatalog;
use crate::graph::{GraphSink, MemoryGraph, StatementExecutor, StatementOutbox};
use crate::ingest::IngestionEngine;
use crate::observability::{init_logging, Event, MetricsRegistry};
use crate::pagination::{PageRequest, PaginationAggregator};
use crate::store::MemoryPartitionedStore;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, request_params, write_error, write_response};

/// Wired components shared by all commands
struct Components {
    config: ServiceConfig,
    store: Arc<MemoryPartitionedStore>,
    checkpoints: CheckpointManager,
    metrics: Arc<MetricsRegistry>,
}

impl Components {
    fn boot(config_path: &Path) -> CliResult<Self> {
        let config = ServiceConfig::load(config_path)?;
        init_logging(&config.logging);
        info!(
            event = %Event::ConfigLoaded,
            path = %config_path.display(),
            "configuration loaded"
        );

        let store = Arc::new(MemoryPartitionedStore::load_json_lines(
            &config.store.records_path,
        )?);
        let checkpoints = CheckpointManager::new(
            Arc::new(LocalCheckpointStore::new(&config.checkpoint.dir)),
            config.checkpoint.object_name.clone(),
        );

        Ok(Self {
            config,
            store,
            checkpoints,
            metrics: Arc::new(MetricsRegistry::new()),
        })
    }

    fn engine(&self) -> CliResult<IngestionEngine> {
        let executor: Arc<dyn StatementExecutor> = match &self.config.graph.outbox_path {
            Some(path) => Arc::new(StatementOutbox::new(path)),
            None => {
                warn!("no graph outbox configured, statements are kept in memory");
                Arc::new(MemoryGraph::new())
            }
        };
        let sink = GraphSink::from_config(executor, &self.config.graph)?;

        Ok(IngestionEngine::new(
            self.store.clone(),
            self.checkpoints.clone(),
            Arc::new(sink),
            self.config.ingest.clone(),
        )
        .with_metrics(self.metrics.clone()))
    }

    fn aggregator(&self) -> CliResult<PaginationAggregator> {
        let catalog = match &self.config.filters_path {
            Some(path) => FilterCatalog::load(path)?,
            None => FilterCatalog::new(),
        };

        Ok(PaginationAggregator::new(
            self.store.clone(),
            Arc::new(catalog),
            self.config.pagination.clone(),
        )
        .with_metrics(self.metrics.clone()))
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Sync { config } => sync(&config),
        Command::Ingest { config } => ingest(&config),
        Command::Query { config } => query(&config),
        Command::Checkpoint { config } => checkpoint(&config),
    }
}

/// Run one ingestion cycle and print its report
pub fn sync(config_path: &Path) -> CliResult<()> {
    let components = Components::boot(config_path)?;
    let engine = components.engine()?;

    let report = engine.sync_once()?;
    write_response(json!({
        "report": report,
        "metrics": components.metrics.snapshot(),
    }))
}

/// Run the polling loop until Ctrl-C
pub fn ingest(config_path: &Path) -> CliResult<()> {
    let components = Components::boot(config_path)?;
    let engine = components.engine()?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    let _ = shutdown_tx.send(());
                }
                Err(e) => warn!(error = %e, "cannot listen for Ctrl-C, stopping"),
            }
        });

        engine.run(shutdown_rx).await;
    });

    write_response(json!({ "metrics": components.metrics.snapshot() }))
}

/// Read request parameters from stdin and print one page
pub fn query(config_path: &Path) -> CliResult<()> {
    let components = Components::boot(config_path)?;
    let aggregator = components.aggregator()?;

    let request = read_request()?;
    let params = request_params(&request)?;

    let result = PageRequest::parse(&params, aggregator.config())
        .and_then(|request| aggregator.fetch(&request));

    match result {
        Ok(page) => write_response(serde_json::to_value(&page)?),
        Err(e) => {
            let err = CliError::from(e);
            write_error(err.code_str(), err.message())?;
            Err(err)
        }
    }
}

/// Print the persisted checkpoint, or `null` when none exists
pub fn checkpoint(config_path: &Path) -> CliResult<()> {
    let components = Components::boot(config_path)?;

    let checkpoint = components.checkpoints.load()?;
    write_response(json!({
        "name": components.checkpoints.name(),
        "checkpoint": checkpoint,
    }))
}
