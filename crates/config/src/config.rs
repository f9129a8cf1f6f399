//! Core configuration structures for batch order submission

use order_batch_types::{SubmissionMode, SubmissionPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log output configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Draft order validation limits
    #[serde(default)]
    pub validation: ValidationSettings,

    /// Submission defaults and orchestrator limits
    #[serde(default)]
    pub submission: SubmissionSettings,

    /// Metrics exposition
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Log output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default = "default_true")]
    pub json: bool,
}

/// Draft order validation limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Largest quantity a single draft order may carry
    #[serde(default = "default_max_quantity")]
    pub max_quantity: u64,
}

/// Submission defaults and orchestrator limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionSettings {
    /// Default concurrency mode offered to the user
    #[serde(default)]
    pub mode: SubmissionMode,

    /// Default pause between sequential submissions in milliseconds
    #[serde(default)]
    pub inter_item_delay_ms: u64,

    /// Default failures tolerated before a run aborts
    #[serde(default)]
    pub max_failures: u32,

    /// Default abort-on-first-error flag
    #[serde(default)]
    pub abort_on_first_error: bool,

    /// Fan-out bound for parallel runs
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: u32,

    /// Error entries kept in a progress snapshot
    #[serde(default = "default_max_error_entries")]
    pub max_error_entries: usize,
}

impl SubmissionSettings {
    /// Policy pre-selected for a new run
    pub fn default_policy(&self) -> SubmissionPolicy {
        SubmissionPolicy {
            mode: self.mode,
            inter_item_delay: Duration::from_millis(self.inter_item_delay_ms),
            max_failures: self.max_failures,
            abort_on_first_error: self.abort_on_first_error,
        }
    }
}

/// Metrics exposition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable the metrics endpoint
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Address the metrics endpoint listens on
    #[serde(default = "default_metrics_addr")]
    pub listen_addr: String,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_quantity() -> u64 {
    1_000_000
}

fn default_max_in_flight() -> u32 {
    8
}

fn default_max_error_entries() -> usize {
    50
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_true(),
        }
    }
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            max_quantity: default_max_quantity(),
        }
    }
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            mode: SubmissionMode::default(),
            inter_item_delay_ms: 0,
            max_failures: 0,
            abort_on_first_error: false,
            max_in_flight: default_max_in_flight(),
            max_error_entries: default_max_error_entries(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            listen_addr: default_metrics_addr(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.validation.max_quantity, 1_000_000);
        assert_eq!(config.submission.max_in_flight, 8);
        assert_eq!(config.submission.max_error_entries, 50);
        assert_eq!(config.submission.mode, SubmissionMode::Parallel);
    }

    #[test]
    fn test_default_policy_from_settings() {
        let settings = SubmissionSettings {
            mode: SubmissionMode::Sequential,
            inter_item_delay_ms: 250,
            max_failures: 2,
            abort_on_first_error: false,
            ..Default::default()
        };

        let policy = settings.default_policy();
        assert_eq!(policy.mode, SubmissionMode::Sequential);
        assert_eq!(policy.inter_item_delay, Duration::from_millis(250));
        assert_eq!(policy.max_failures, 2);
        assert!(!policy.abort_on_first_error);
    }
}
