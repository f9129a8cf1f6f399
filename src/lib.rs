//! Batch order submission for a trading dashboard
//!
//! Users edit a table of draft orders; every valid draft is then submitted
//! to the order API under a chosen policy, with live progress, a failure
//! abort threshold and mid-flight cancellation.
//!
//! This crate wires the workspace members together:
//! - [`types`]: orders, policies, progress and reports
//! - [`orchestrator`]: draft store, validator and run orchestration
//! - [`config`]: layered configuration with hot reload
//! - [`metrics`]: prometheus metrics and tracing setup

use std::sync::Arc;

pub use order_batch_config as config;
pub use order_batch_metrics as metrics;
pub use order_batch_orchestrator as orchestrator;
pub use order_batch_types as types;

use order_batch_config::{AppConfig, LoggingConfig};
use order_batch_metrics::{
    init_tracing, MetricsCollector, MetricsServer, TracingError, TracingOptions,
};
use order_batch_orchestrator::{
    BatchOrchestrator, BuilderError, OrchestratorConfig, OrchestratorError, OrderSubmitter,
    OrderValidator, RunHandle,
};

/// Build an orchestrator whose limits come from `config`
pub fn orchestrator_from_config(
    config: &AppConfig,
    submitter: Arc<dyn OrderSubmitter>,
    metrics: Arc<MetricsCollector>,
) -> Result<BatchOrchestrator, BuilderError> {
    BatchOrchestrator::builder()
        .with_submitter(submitter)
        .with_validator(OrderValidator::from_settings(&config.validation))
        .with_config(OrchestratorConfig::from(&config.submission))
        .with_metrics(metrics)
        .build()
}

/// Start a run with the validation limits and policy defaults of `config`
///
/// Meant to be called with the latest [`config::ConfigWatcher`] snapshot so
/// reloaded settings reach the next run. The fan-out bound and error cap stay
/// as the orchestrator was built with.
pub fn start_configured_run(
    orchestrator: &BatchOrchestrator,
    config: &AppConfig,
) -> Result<RunHandle, OrchestratorError> {
    let validator = OrderValidator::from_settings(&config.validation);
    let current = orchestrator.store().read().validator().max_quantity();
    if current != validator.max_quantity() {
        orchestrator.apply_validation_settings(&config.validation);
    }

    orchestrator.start_run(config.submission.default_policy())
}

/// Tracing options matching the logging section
///
/// `RUST_LOG` still takes precedence when set.
pub fn tracing_options(logging: &LoggingConfig) -> TracingOptions {
    TracingOptions {
        filter: format!("{},order_batch=debug", logging.level),
        json: logging.json,
    }
}

/// Install the global tracing subscriber described by `config`
pub fn init_logging(
    config: &AppConfig,
    metrics: Arc<MetricsCollector>,
) -> Result<(), TracingError> {
    init_tracing(&tracing_options(&config.logging), metrics)
}

/// Metrics endpoint described by the metrics section, `None` when disabled
pub fn metrics_server(config: &AppConfig, metrics: Arc<MetricsCollector>) -> Option<MetricsServer> {
    config
        .metrics
        .enabled
        .then(|| MetricsServer::new(metrics, config.metrics.listen_addr.clone()))
}
