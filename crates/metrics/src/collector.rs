use std::time::Duration;

use order_batch_types::{RunOutcome, RunStatus};
use prometheus::{Encoder, TextEncoder};

use crate::metrics::*;

/// Metrics collector for batch order submission
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // RUN METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Record a run starting with `size` orders in its snapshot
    pub fn record_run_started(&self, size: usize) {
        RUNS_STARTED.inc();
        ACTIVE_RUNS.inc();
        RUN_SIZE.observe(size as f64);
    }

    /// Record a run reaching a terminal status
    pub fn record_run_finished(&self, status: RunStatus, duration: Duration) {
        RUNS_FINISHED.with_label_values(&[status.as_str()]).inc();
        ACTIVE_RUNS.dec();
        RUN_DURATION.observe(duration.as_millis() as f64);
    }

    /// Record a rejected `start_run` call
    pub fn record_run_rejected(&self, reason: &str) {
        RUN_STARTS_REJECTED.with_label_values(&[reason]).inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SUBMISSION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Record one submission attempt.
    ///
    /// `error_kind` is only used for failed outcomes.
    pub fn record_submission(&self, outcome: &RunOutcome, error_kind: Option<&str>, latency: Duration) {
        let label = outcome.label();
        SUBMISSIONS.with_label_values(&[label]).inc();
        SUBMISSION_LATENCY
            .with_label_values(&[label])
            .observe(latency.as_millis() as f64);

        if let RunOutcome::Failed(_) = outcome {
            SUBMISSION_FAILURES
                .with_label_values(&[error_kind.unwrap_or("unknown")])
                .inc();
        }
    }

    /// Record items a run never attempted
    pub fn record_not_attempted(&self, count: usize) {
        ITEMS_NOT_ATTEMPTED.inc_by(count as u64);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DRAFT METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Record invalid drafts that were left out of a run
    pub fn record_invalid_excluded(&self, count: usize) {
        DRAFTS_EXCLUDED_INVALID.inc_by(count as u64);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SYSTEM METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_error_event(&self, target: &str) {
        ERROR_EVENTS.with_label_values(&[target]).inc();
    }

    /// Export all metrics in Prometheus text format
    pub fn export_metrics(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::EncodingError(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingError(e.to_string()))
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics errors
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("encoding error: {0}")]
    EncodingError(String),
}
