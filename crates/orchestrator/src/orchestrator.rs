use order_batch_config::{SubmissionSettings, ValidationSettings};
use order_batch_metrics::{MetricsCollector, RunSpan};
use order_batch_types::{
    FieldUpdate, OrderId, RunId, RunProgress, RunReport, SubmissionPolicy, ValidationStatus,
    DEFAULT_ERROR_CAP,
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};

use crate::executor::{OrderSubmitter, SubmissionExecutor};
use crate::progress::{ProgressPublisher, ProgressReporter};
use crate::run::{self, RunPlan};
use crate::store::{DraftStore, StoreError};
use crate::validator::OrderValidator;

/// Default fan-out bound for parallel runs
pub const DEFAULT_MAX_IN_FLIGHT: u32 = 8;

/// Configuration for the orchestrator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Submissions in flight at once in parallel mode
    pub max_in_flight: u32,

    /// Error entries kept in each progress snapshot
    pub error_cap: usize,
}

impl OrchestratorConfig {
    pub fn with_max_in_flight(mut self, max_in_flight: u32) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub fn with_error_cap(mut self, error_cap: usize) -> Self {
        self.error_cap = error_cap;
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            error_cap: DEFAULT_ERROR_CAP,
        }
    }
}

impl From<&SubmissionSettings> for OrchestratorConfig {
    fn from(settings: &SubmissionSettings) -> Self {
        Self {
            max_in_flight: settings.max_in_flight,
            error_cap: settings.max_error_entries,
        }
    }
}

/// Builder error
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("missing required field: {field}")]
    MissingField { field: String },
}

/// Builder for BatchOrchestrator
#[derive(Default)]
pub struct BatchOrchestratorBuilder {
    submitter: Option<Arc<dyn OrderSubmitter>>,
    validator: Option<OrderValidator>,
    store: Option<Arc<RwLock<DraftStore>>>,
    metrics: Option<Arc<MetricsCollector>>,
    config: OrchestratorConfig,
}

impl BatchOrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submitter(mut self, submitter: Arc<dyn OrderSubmitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    /// Validator for a fresh store; ignored when `with_store` is used
    pub fn with_validator(mut self, validator: OrderValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Share an existing draft store
    pub fn with_store(mut self, store: Arc<RwLock<DraftStore>>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the BatchOrchestrator, validating that all required fields are set
    pub fn build(self) -> Result<BatchOrchestrator, BuilderError> {
        let submitter = self.submitter.ok_or_else(|| BuilderError::MissingField {
            field: "submitter".to_string(),
        })?;

        let store = self.store.unwrap_or_else(|| {
            let validator = self.validator.unwrap_or_default();
            Arc::new(RwLock::new(DraftStore::new(validator)))
        });
        let metrics = self.metrics.unwrap_or_default();

        Ok(BatchOrchestrator {
            executor: SubmissionExecutor::new(submitter, metrics.clone()),
            store,
            metrics,
            config: self.config,
            active: Mutex::new(None),
        })
    }
}

/// The run most recently started by an orchestrator
struct ActiveRun {
    run_id: RunId,
    reporter: ProgressReporter,
    task: AbortHandle,
}

impl ActiveRun {
    /// A run whose task ended without publishing a terminal status is over too
    fn is_live(&self) -> bool {
        !self.reporter.is_terminal() && !self.task.is_finished()
    }
}

/// Owns the draft store and drives batch submission runs against it
///
/// At most one run is active at a time. A run works on a snapshot of the
/// valid drafts, so the store stays editable while it is in flight.
pub struct BatchOrchestrator {
    store: Arc<RwLock<DraftStore>>,
    executor: SubmissionExecutor,
    metrics: Arc<MetricsCollector>,
    config: OrchestratorConfig,
    active: Mutex<Option<ActiveRun>>,
}

impl BatchOrchestrator {
    /// Create a new builder for constructing a BatchOrchestrator
    pub fn builder() -> BatchOrchestratorBuilder {
        BatchOrchestratorBuilder::new()
    }

    pub fn store(&self) -> &Arc<RwLock<DraftStore>> {
        &self.store
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Edit one field of a draft, returning its new validation status
    pub fn update_order(
        &self,
        id: OrderId,
        update: &FieldUpdate,
    ) -> Result<ValidationStatus, OrchestratorError> {
        let mut store = self.store.write();
        let order = store.update(id, update)?;
        Ok(order.status.clone())
    }

    /// Apply one field edit to several drafts at once
    pub fn bulk_apply(
        &self,
        update: &FieldUpdate,
        targets: &[OrderId],
    ) -> Result<usize, OrchestratorError> {
        Ok(self.store.write().bulk_apply(update, targets)?)
    }

    /// Re-validate every draft against new limits
    pub fn apply_validation_settings(&self, settings: &ValidationSettings) {
        self.store
            .write()
            .set_validator(OrderValidator::from_settings(settings));
        info!(max_quantity = settings.max_quantity, "Validation limits updated");
    }

    /// Id of the run currently in progress, if any
    pub fn active_run(&self) -> Option<RunId> {
        self.active
            .lock()
            .as_ref()
            .filter(|run| run.is_live())
            .map(|run| run.run_id)
    }

    /// Start a run over the currently valid drafts.
    ///
    /// Rejected when another run is still active or when no draft is valid;
    /// in both cases no progress is created.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_run(&self, policy: SubmissionPolicy) -> Result<RunHandle, OrchestratorError> {
        let mut active = self.active.lock();

        if let Some(run) = active.as_ref() {
            if run.is_live() {
                self.metrics.record_run_rejected("run_already_active");
                return Err(OrchestratorError::RunAlreadyActive { run_id: run.run_id });
            }
        }

        let (snapshot, excluded) = {
            let store = self.store.read();
            let snapshot = store.valid_snapshot();
            let excluded = store.len() - snapshot.len();
            (snapshot, excluded)
        };

        if snapshot.is_empty() {
            self.metrics.record_run_rejected("no_valid_orders");
            return Err(OrchestratorError::NoValidOrders);
        }
        let size = snapshot.len();
        let total = match run_total(size) {
            Ok(total) => total,
            Err(e) => {
                self.metrics.record_run_rejected("too_many_orders");
                return Err(e);
            }
        };

        let run_id = RunId::new();
        let (publisher, reporter) = ProgressPublisher::channel(RunProgress::new(
            run_id,
            total,
            self.config.error_cap,
        ));
        let cancel = CancellationToken::new();
        let span = RunSpan::new(run_id.to_string(), policy.mode.as_str(), size);

        self.metrics.record_invalid_excluded(excluded);
        self.metrics.record_run_started(size);

        let plan = RunPlan {
            snapshot,
            policy,
            max_in_flight: self.config.max_in_flight,
        };
        let task = tokio::spawn(
            run_task(
                plan,
                self.executor.clone(),
                cancel.clone(),
                publisher,
                self.store.clone(),
                self.metrics.clone(),
            )
            .instrument(span.span()),
        );

        *active = Some(ActiveRun {
            run_id,
            reporter: reporter.clone(),
            task: task.abort_handle(),
        });

        Ok(RunHandle {
            run_id,
            cancel,
            reporter,
            task,
        })
    }

    /// Request cancellation of a run
    pub fn cancel(&self, handle: &RunHandle) -> Result<(), OrchestratorError> {
        handle.cancel()
    }

    /// Latest progress snapshot of a run
    pub fn progress(&self, handle: &RunHandle) -> RunProgress {
        handle.progress()
    }

    /// Change notifications for a run's progress
    pub fn subscribe(&self, handle: &RunHandle) -> watch::Receiver<RunProgress> {
        handle.subscribe()
    }
}

/// Item count of a run, which `RunProgress` keeps as a `u32`
fn run_total(size: usize) -> Result<u32, OrchestratorError> {
    u32::try_from(size).map_err(|_| OrchestratorError::TooManyOrders { count: size })
}

async fn run_task(
    plan: RunPlan,
    executor: SubmissionExecutor,
    cancel: CancellationToken,
    mut publisher: ProgressPublisher,
    store: Arc<RwLock<DraftStore>>,
    metrics: Arc<MetricsCollector>,
) -> RunReport {
    let started = Instant::now();
    info!(
        total = plan.snapshot.len(),
        max_failures = plan.policy.effective_max_failures(),
        delay_ms = plan.policy.inter_item_delay.as_millis() as u64,
        "Run started"
    );

    let report = run::execute(plan, &executor, &cancel, &mut publisher).await;

    // Outcomes land in the store before anyone can observe the terminal status
    let applied = store.write().record_outcomes(&report);
    if applied < report.outcomes.len() {
        warn!(
            skipped = report.outcomes.len() - applied,
            "Drafts removed or edited during the run; their outcomes were not stored"
        );
    }
    publisher.publish();

    let progress = &report.progress;
    let not_attempted = report.not_attempted().count();
    metrics.record_not_attempted(not_attempted);
    metrics.record_run_finished(progress.status(), started.elapsed());

    info!(
        status = %progress.status(),
        attempted = progress.attempted(),
        succeeded = progress.succeeded(),
        failed = progress.failed(),
        not_attempted,
        "Run finished"
    );

    report
}

/// Handle to a started run
pub struct RunHandle {
    run_id: RunId,
    cancel: CancellationToken,
    reporter: ProgressReporter,
    task: JoinHandle<RunReport>,
}

impl RunHandle {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn progress(&self) -> RunProgress {
        self.reporter.progress()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunProgress> {
        self.reporter.subscribe()
    }

    pub fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }

    /// True once a terminal status has been published or the run task
    /// has ended
    pub fn is_finished(&self) -> bool {
        self.reporter.is_terminal() || self.task.is_finished()
    }

    /// Request cancellation. No new submissions start once the run observes
    /// it; submissions already in flight finish and are recorded.
    ///
    /// Repeated requests are accepted until the run finishes.
    pub fn cancel(&self) -> Result<(), OrchestratorError> {
        if self.is_finished() {
            return Err(OrchestratorError::RunAlreadyFinished {
                run_id: self.run_id,
            });
        }

        if !self.cancel.is_cancelled() {
            info!(run_id = %self.run_id, "Run cancellation requested");
            self.cancel.cancel();
        }
        Ok(())
    }

    /// Wait for the run to finish and return its report
    pub async fn wait(self) -> Result<RunReport, OrchestratorError> {
        self.task
            .await
            .map_err(|e| OrchestratorError::RunTaskFailed {
                reason: e.to_string(),
            })
    }
}

/// Orchestrator errors
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no valid orders to submit")]
    NoValidOrders,

    #[error("run {run_id} is still active")]
    RunAlreadyActive { run_id: RunId },

    #[error("run {run_id} has already finished")]
    RunAlreadyFinished { run_id: RunId },

    #[error("{count} orders exceed the per-run limit")]
    TooManyOrders { count: usize },

    #[error("run task failed: {reason}")]
    RunTaskFailed { reason: String },

    #[error("draft store error: {0}")]
    Store(#[from] StoreError),
}
