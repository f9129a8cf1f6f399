use async_trait::async_trait;
use futures::FutureExt;
use order_batch_metrics::MetricsCollector;
use order_batch_types::{DraftOrder, OrderId, RunOutcome, SubmissionError, SubmissionReceipt};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// External order API, one call per draft order
///
/// Implementations decide their own transport and timeouts; any error is
/// recorded as a failed submission.
#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    async fn submit(&self, order: &DraftOrder) -> Result<SubmissionReceipt, SubmissionError>;
}

/// Wraps the submitter with logging and latency metrics
#[derive(Clone)]
pub struct SubmissionExecutor {
    submitter: Arc<dyn OrderSubmitter>,
    metrics: Arc<MetricsCollector>,
}

/// Result of submitting one snapshot item
#[derive(Debug, Clone)]
pub struct Attempt {
    /// Position in the run snapshot
    pub index: usize,
    pub order_id: OrderId,
    pub symbol: String,
    pub result: Result<SubmissionReceipt, SubmissionError>,
    pub latency: Duration,
}

impl Attempt {
    pub fn outcome(&self) -> RunOutcome {
        match &self.result {
            Ok(_) => RunOutcome::Succeeded,
            Err(e) => RunOutcome::Failed(e.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Error list entry, `"<id> <symbol>: <reason>"`
    pub fn error_entry(&self) -> Option<String> {
        self.result
            .as_ref()
            .err()
            .map(|e| format!("{} {}: {}", self.order_id, self.symbol, e))
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.result.as_ref().ok()
    }
}

impl SubmissionExecutor {
    pub fn new(submitter: Arc<dyn OrderSubmitter>, metrics: Arc<MetricsCollector>) -> Self {
        Self { submitter, metrics }
    }

    /// Submit one order; never fails, errors are captured in the attempt
    ///
    /// A panicking submitter is recorded as a failed submission so the run
    /// keeps its counts and still reaches a terminal status.
    pub async fn attempt(&self, index: usize, order: DraftOrder) -> Attempt {
        debug!(order_id = %order.id, symbol = %order.symbol(), "Submitting order");

        let started = Instant::now();
        let result = AssertUnwindSafe(self.submitter.submit(&order))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(SubmissionError::panicked(panic_message(&*panic)))
            });
        let latency = started.elapsed();

        match &result {
            Ok(receipt) => debug!(
                order_id = %order.id,
                venue_order_id = %receipt.venue_order_id,
                latency_ms = latency.as_millis() as u64,
                "Order accepted"
            ),
            Err(e) => warn!(
                order_id = %order.id,
                symbol = %order.symbol(),
                error = %e,
                "Order submission failed"
            ),
        }

        let attempt = Attempt {
            index,
            order_id: order.id,
            symbol: order.fields.symbol,
            result,
            latency,
        };

        let error_kind = attempt.result.as_ref().err().map(SubmissionError::kind);
        self.metrics
            .record_submission(&attempt.outcome(), error_kind, latency);

        attempt
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_batch_types::{OrderFields, Side};
    use rust_decimal_macros::dec;

    struct FixedSubmitter {
        fail: bool,
    }

    #[async_trait]
    impl OrderSubmitter for FixedSubmitter {
        async fn submit(&self, order: &DraftOrder) -> Result<SubmissionReceipt, SubmissionError> {
            if self.fail {
                Err(SubmissionError::rejected("insufficient buying power"))
            } else {
                Ok(SubmissionReceipt::new(order.id, "VENUE-1"))
            }
        }
    }

    fn draft() -> DraftOrder {
        DraftOrder::new(OrderId(3), OrderFields::limit("AAPL", Side::Buy, 10, dec!(190)))
    }

    fn executor(fail: bool) -> SubmissionExecutor {
        SubmissionExecutor::new(
            Arc::new(FixedSubmitter { fail }),
            Arc::new(MetricsCollector::new()),
        )
    }

    #[tokio::test]
    async fn test_successful_attempt() {
        let attempt = executor(false).attempt(0, draft()).await;

        assert!(attempt.is_success());
        assert_eq!(attempt.outcome(), RunOutcome::Succeeded);
        assert_eq!(attempt.error_entry(), None);
        assert_eq!(attempt.receipt().unwrap().venue_order_id, "VENUE-1");
    }

    #[tokio::test]
    async fn test_failed_attempt_entry_format() {
        let attempt = executor(true).attempt(4, draft()).await;

        assert_eq!(attempt.index, 4);
        assert_eq!(
            attempt.outcome(),
            RunOutcome::Failed("rejected: insufficient buying power".to_string())
        );
        assert_eq!(
            attempt.error_entry().unwrap(),
            "draft-3 AAPL: rejected: insufficient buying power"
        );
    }

    struct PanickingSubmitter;

    #[async_trait]
    impl OrderSubmitter for PanickingSubmitter {
        async fn submit(&self, order: &DraftOrder) -> Result<SubmissionReceipt, SubmissionError> {
            panic!("venue client lost session for {}", order.symbol());
        }
    }

    #[tokio::test]
    async fn test_panicking_submitter_becomes_failure() {
        let executor = SubmissionExecutor::new(
            Arc::new(PanickingSubmitter),
            Arc::new(MetricsCollector::new()),
        );
        let attempt = executor.attempt(0, draft()).await;

        assert!(!attempt.is_success());
        assert_eq!(
            attempt.error_entry().unwrap(),
            "draft-3 AAPL: submitter panicked: venue client lost session for AAPL"
        );
    }
}
