use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a run dispatches its submissions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionMode {
    /// All items dispatched concurrently, up to the fan-out bound
    #[default]
    Parallel,
    /// One item at a time in snapshot order
    Sequential,
}

impl SubmissionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionMode::Parallel => "parallel",
            SubmissionMode::Sequential => "sequential",
        }
    }
}

/// Per-run submission settings, fixed for the lifetime of a run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPolicy {
    pub mode: SubmissionMode,

    /// Pause between consecutive submissions (sequential mode only)
    #[serde(default)]
    pub inter_item_delay: Duration,

    /// Failures tolerated before the run aborts
    #[serde(default)]
    pub max_failures: u32,

    /// Equivalent to `max_failures = 0`
    #[serde(default)]
    pub abort_on_first_error: bool,
}

impl SubmissionPolicy {
    pub fn parallel() -> Self {
        Self {
            mode: SubmissionMode::Parallel,
            ..Default::default()
        }
    }

    pub fn sequential() -> Self {
        Self {
            mode: SubmissionMode::Sequential,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.inter_item_delay = delay;
        self
    }

    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures;
        self
    }

    pub fn with_abort_on_first_error(mut self, enabled: bool) -> Self {
        self.abort_on_first_error = enabled;
        self
    }

    /// Failure threshold actually enforced
    pub fn effective_max_failures(&self) -> u32 {
        if self.abort_on_first_error {
            0
        } else {
            self.max_failures
        }
    }

    /// Whether `failed` failures exceed the tolerated threshold
    pub fn should_abort(&self, failed: u32) -> bool {
        failed > self.effective_max_failures()
    }

    /// Delay to wait between items, `None` when no wait applies
    pub fn pacing_delay(&self) -> Option<Duration> {
        match self.mode {
            SubmissionMode::Sequential if !self.inter_item_delay.is_zero() => {
                Some(self.inter_item_delay)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_threshold() {
        let policy = SubmissionPolicy::sequential().with_max_failures(2);
        assert!(!policy.should_abort(0));
        assert!(!policy.should_abort(2));
        assert!(policy.should_abort(3));
    }

    #[test]
    fn test_abort_on_first_error_overrides_max_failures() {
        let policy = SubmissionPolicy::parallel()
            .with_max_failures(10)
            .with_abort_on_first_error(true);
        assert_eq!(policy.effective_max_failures(), 0);
        assert!(!policy.should_abort(0));
        assert!(policy.should_abort(1));
    }

    #[test]
    fn test_pacing_delay_only_in_sequential_mode() {
        let delay = Duration::from_millis(250);
        assert_eq!(
            SubmissionPolicy::sequential().with_delay(delay).pacing_delay(),
            Some(delay)
        );
        assert_eq!(SubmissionPolicy::parallel().with_delay(delay).pacing_delay(), None);
        assert_eq!(SubmissionPolicy::sequential().pacing_delay(), None);
    }
}
