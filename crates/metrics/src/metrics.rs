use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge, Histogram, HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

lazy_static! {
    // ═══════════════════════════════════════════════════════════════════════════
    // RUN METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Total number of batch runs started
    pub static ref RUNS_STARTED: IntCounter = register_int_counter!(
        "order_batch_runs_started_total",
        "Total number of batch submission runs started"
    )
    .unwrap();

    /// Finished runs by terminal status
    pub static ref RUNS_FINISHED: IntCounterVec = register_int_counter_vec!(
        "order_batch_runs_finished_total",
        "Total batch runs finished, by terminal status",
        &["status"]
    )
    .unwrap();

    /// Run start attempts rejected by the orchestrator
    pub static ref RUN_STARTS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "order_batch_run_starts_rejected_total",
        "Total run start requests rejected, by reason",
        &["reason"]
    )
    .unwrap();

    /// Current number of active runs
    pub static ref ACTIVE_RUNS: IntGauge = register_int_gauge!(
        "order_batch_runs_active",
        "Current number of active batch runs"
    )
    .unwrap();

    /// Run duration histogram (in milliseconds)
    pub static ref RUN_DURATION: Histogram = register_histogram!(
        "order_batch_run_duration_ms",
        "Batch run duration in milliseconds",
        vec![100.0, 500.0, 1000.0, 5000.0, 10000.0, 30000.0, 60000.0, 300000.0]
    )
    .unwrap();

    /// Orders in each run snapshot
    pub static ref RUN_SIZE: Histogram = register_histogram!(
        "order_batch_run_size",
        "Number of orders captured by a run",
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0]
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // SUBMISSION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Submissions by outcome
    pub static ref SUBMISSIONS: IntCounterVec = register_int_counter_vec!(
        "order_batch_submissions_total",
        "Total order submissions, by outcome",
        &["outcome"]
    )
    .unwrap();

    /// Submission failures by error kind
    pub static ref SUBMISSION_FAILURES: IntCounterVec = register_int_counter_vec!(
        "order_batch_submission_failures_total",
        "Total failed order submissions, by error kind",
        &["kind"]
    )
    .unwrap();

    /// Items skipped because their run aborted or was cancelled
    pub static ref ITEMS_NOT_ATTEMPTED: IntCounter = register_int_counter!(
        "order_batch_items_not_attempted_total",
        "Total draft orders never attempted by their run"
    )
    .unwrap();

    /// Submission latency by outcome
    pub static ref SUBMISSION_LATENCY: HistogramVec = register_histogram_vec!(
        "order_batch_submission_latency_ms",
        "Order submission latency in milliseconds",
        &["outcome"],
        vec![10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // DRAFT METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Invalid drafts left out of a run snapshot
    pub static ref DRAFTS_EXCLUDED_INVALID: IntCounter = register_int_counter!(
        "order_batch_drafts_excluded_invalid_total",
        "Total invalid draft orders excluded from run snapshots"
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // SYSTEM METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Error-level log events, by target
    pub static ref ERROR_EVENTS: IntCounterVec = register_int_counter_vec!(
        "order_batch_error_events_total",
        "Total error-level log events",
        &["target"]
    )
    .unwrap();
}
