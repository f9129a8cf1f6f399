use order_batch_types::{RunProgress, RunStatus};
use tokio::sync::watch;

use crate::executor::Attempt;

/// Writer side of a run's progress
///
/// Owned by the run task alone. Every change is published as a whole
/// snapshot, so readers never see a partially applied outcome.
pub struct ProgressPublisher {
    progress: RunProgress,
    tx: watch::Sender<RunProgress>,
}

/// Read-only, tear-free view of a run's progress
#[derive(Clone)]
pub struct ProgressReporter {
    rx: watch::Receiver<RunProgress>,
}

impl ProgressPublisher {
    /// Create a publisher and the reporter that observes it
    pub fn channel(progress: RunProgress) -> (Self, ProgressReporter) {
        let (tx, rx) = watch::channel(progress.clone());
        (Self { progress, tx }, ProgressReporter { rx })
    }

    pub fn progress(&self) -> &RunProgress {
        &self.progress
    }

    /// Count one finished attempt and publish the new snapshot
    pub fn record(&mut self, attempt: &Attempt) -> bool {
        let changed = match attempt.error_entry() {
            None => self.progress.record_success(),
            Some(entry) => self.progress.record_failure(entry),
        };

        if changed {
            self.publish();
        }
        changed
    }

    /// Move to a terminal status without publishing it yet
    ///
    /// The caller publishes once the outcomes are visible in the store.
    pub fn finish(&mut self, status: RunStatus) -> bool {
        self.progress.finish(status)
    }

    pub fn publish(&self) {
        self.tx.send_replace(self.progress.clone());
    }
}

impl ProgressReporter {
    /// Latest published snapshot
    pub fn progress(&self) -> RunProgress {
        self.rx.borrow().clone()
    }

    /// Receiver notified on every published change
    pub fn subscribe(&self) -> watch::Receiver<RunProgress> {
        self.rx.clone()
    }

    pub fn is_terminal(&self) -> bool {
        self.rx.borrow().is_terminal()
    }

    /// Wait until a terminal snapshot is published
    ///
    /// Returns `None` if the run task went away without publishing one.
    pub async fn wait_terminal(&self) -> Option<RunProgress> {
        let mut rx = self.rx.clone();
        let terminal = rx
            .wait_for(RunProgress::is_terminal)
            .await
            .ok()
            .map(|progress| progress.clone());
        terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_batch_types::{OrderId, RunId, SubmissionError, SubmissionReceipt};
    use std::time::Duration;

    fn attempt(index: usize, ok: bool) -> Attempt {
        let order_id = OrderId(index as u64 + 1);
        Attempt {
            index,
            order_id,
            symbol: "IBM".to_string(),
            result: if ok {
                Ok(SubmissionReceipt::new(order_id, "V-1"))
            } else {
                Err(SubmissionError::Timeout)
            },
            latency: Duration::from_millis(5),
        }
    }

    fn channel(total: u32) -> (ProgressPublisher, ProgressReporter) {
        ProgressPublisher::channel(RunProgress::new(RunId::new(), total, 10))
    }

    #[test]
    fn test_reporter_sees_published_snapshots() {
        let (mut publisher, reporter) = channel(2);

        publisher.record(&attempt(0, true));
        let snapshot = reporter.progress();
        assert_eq!(snapshot.attempted(), 1);
        assert_eq!(snapshot.percentage(), 50);

        publisher.record(&attempt(1, false));
        let snapshot = reporter.progress();
        assert_eq!(snapshot.failed(), 1);
        assert_eq!(snapshot.errors().next(), Some("draft-2 IBM: timed out"));
        assert!(snapshot.is_consistent());
    }

    #[test]
    fn test_finish_is_not_visible_until_published() {
        let (mut publisher, reporter) = channel(1);
        publisher.record(&attempt(0, true));

        assert!(publisher.finish(RunStatus::Completed));
        assert!(!reporter.is_terminal());

        publisher.publish();
        assert!(reporter.is_terminal());
        assert_eq!(reporter.progress().status(), RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_wait_terminal() {
        let (mut publisher, reporter) = channel(1);

        let waiter = tokio::spawn({
            let reporter = reporter.clone();
            async move { reporter.wait_terminal().await }
        });

        publisher.record(&attempt(0, false));
        publisher.finish(RunStatus::Aborted);
        publisher.publish();

        let progress = waiter.await.unwrap().unwrap();
        assert_eq!(progress.status(), RunStatus::Aborted);
    }

    #[tokio::test]
    async fn test_wait_terminal_without_publisher() {
        let (publisher, reporter) = channel(1);
        drop(publisher);

        assert!(reporter.wait_terminal().await.is_none());
    }
}
