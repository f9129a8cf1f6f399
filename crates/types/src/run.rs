use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use uuid::Uuid;

use crate::{OrderId, SubmissionReceipt};

/// Default number of error entries retained in a progress snapshot
pub const DEFAULT_ERROR_CAP: usize = 50;

/// Identifier of one batch submission run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal per-item result of a run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded,
    Failed(String),
    NotAttempted,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Succeeded => "succeeded",
            RunOutcome::Failed(_) => "failed",
            RunOutcome::NotAttempted => "not_attempted",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Aborted,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Aborted => "aborted",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate state of a run.
///
/// Counters only move through the `record_*` methods, which keep
/// `succeeded + failed == attempted <= total` and refuse to change anything
/// once the run has left `Running`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProgress {
    run_id: RunId,
    total: u32,
    attempted: u32,
    succeeded: u32,
    failed: u32,
    status: RunStatus,
    /// Most recent first
    errors: VecDeque<String>,
    error_cap: usize,
    percentage: u8,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl RunProgress {
    pub fn new(run_id: RunId, total: u32, error_cap: usize) -> Self {
        Self {
            run_id,
            total,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            status: RunStatus::Running,
            errors: VecDeque::new(),
            error_cap,
            percentage: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn attempted(&self) -> u32 {
        self.attempted
    }

    pub fn succeeded(&self) -> u32 {
        self.succeeded
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(String::as_str)
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn remaining(&self) -> u32 {
        self.total - self.attempted
    }

    /// Record a successful attempt. Returns false if nothing changed.
    pub fn record_success(&mut self) -> bool {
        if !self.can_record() {
            return false;
        }
        self.attempted += 1;
        self.succeeded += 1;
        self.refresh_percentage();
        true
    }

    /// Record a failed attempt with its formatted error entry.
    /// Returns false if nothing changed.
    pub fn record_failure(&mut self, entry: impl Into<String>) -> bool {
        if !self.can_record() {
            return false;
        }
        self.attempted += 1;
        self.failed += 1;
        self.errors.push_front(entry.into());
        self.errors.truncate(self.error_cap);
        self.refresh_percentage();
        true
    }

    /// Move to a terminal status. Returns false if already terminal or if
    /// `status` is `Running`.
    pub fn finish(&mut self, status: RunStatus) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        self.status = status;
        self.finished_at = Some(Utc::now());
        true
    }

    /// Whether the counters satisfy `succeeded + failed == attempted <= total`
    pub fn is_consistent(&self) -> bool {
        self.succeeded + self.failed == self.attempted && self.attempted <= self.total
    }

    fn can_record(&self) -> bool {
        self.status == RunStatus::Running && self.attempted < self.total
    }

    fn refresh_percentage(&mut self) {
        self.percentage = percentage_of(self.attempted, self.total);
    }
}

/// `attempted/total` as a percentage rounded to the nearest integer
pub fn percentage_of(attempted: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let attempted = u64::from(attempted.min(total));
    let total = u64::from(total);
    ((attempted * 200 + total) / (total * 2)) as u8
}

/// Outcome of a single item within a finished run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub order_id: OrderId,
    /// Draft revision that was submitted
    #[serde(default)]
    pub revision: u64,
    pub symbol: String,
    pub outcome: RunOutcome,
    pub receipt: Option<SubmissionReceipt>,
}

/// Authoritative record of a finished run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub progress: RunProgress,
    /// In snapshot order
    pub outcomes: Vec<ItemOutcome>,
}

impl RunReport {
    pub fn outcome_of(&self, order_id: OrderId) -> Option<&RunOutcome> {
        self.outcomes
            .iter()
            .find(|item| item.order_id == order_id)
            .map(|item| &item.outcome)
    }

    pub fn count(&self, label: &str) -> usize {
        self.outcomes
            .iter()
            .filter(|item| item.outcome.label() == label)
            .count()
    }

    pub fn not_attempted(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.outcomes
            .iter()
            .filter(|item| item.outcome == RunOutcome::NotAttempted)
            .map(|item| item.order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage_of(0, 3), 0);
        assert_eq!(percentage_of(1, 3), 33);
        assert_eq!(percentage_of(2, 3), 67);
        assert_eq!(percentage_of(3, 3), 100);
        assert_eq!(percentage_of(1, 8), 13);
        assert_eq!(percentage_of(0, 0), 0);
    }

    #[test]
    fn test_progress_counts_stay_consistent() {
        let mut progress = RunProgress::new(RunId::new(), 3, DEFAULT_ERROR_CAP);
        assert!(progress.record_success());
        assert!(progress.record_failure("draft-2 MSFT: rejected"));

        assert_eq!(progress.attempted(), 2);
        assert_eq!(progress.succeeded(), 1);
        assert_eq!(progress.failed(), 1);
        assert_eq!(progress.percentage(), 67);
        assert!(progress.is_consistent());
    }

    #[test]
    fn test_progress_refuses_more_than_total() {
        let mut progress = RunProgress::new(RunId::new(), 1, DEFAULT_ERROR_CAP);
        assert!(progress.record_success());
        assert!(!progress.record_success());
        assert_eq!(progress.attempted(), 1);
    }

    #[test]
    fn test_terminal_status_is_sticky() {
        let mut progress = RunProgress::new(RunId::new(), 2, DEFAULT_ERROR_CAP);
        assert!(!progress.finish(RunStatus::Running));
        assert!(progress.finish(RunStatus::Aborted));
        assert!(!progress.finish(RunStatus::Completed));
        assert_eq!(progress.status(), RunStatus::Aborted);
        assert!(progress.finished_at().is_some());

        // No more counting once terminal
        assert!(!progress.record_success());
        assert_eq!(progress.attempted(), 0);
    }

    #[test]
    fn test_errors_are_capped_most_recent_first() {
        let mut progress = RunProgress::new(RunId::new(), 5, 2);
        progress.record_failure("first");
        progress.record_failure("second");
        progress.record_failure("third");

        let errors: Vec<&str> = progress.errors().collect();
        assert_eq!(errors, vec!["third", "second"]);
        assert_eq!(progress.failed(), 3);
    }
}
