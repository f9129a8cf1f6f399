//! Configuration validation

use crate::{AppConfig, ConfigError, Result};
use std::net::SocketAddr;

/// Upper bound on the parallel fan-out a config may request
pub const MAX_IN_FLIGHT_LIMIT: u32 = 256;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration
///
/// All problems are collected and reported together.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    if let Err(e) = validate_log_level(&config.logging.level) {
        errors.push(e);
    }

    if config.validation.max_quantity == 0 {
        errors.push(ValidationError::new(
            "validation.max_quantity",
            "max quantity must be greater than 0",
        ));
    }

    let submission = &config.submission;
    if submission.max_in_flight == 0 || submission.max_in_flight > MAX_IN_FLIGHT_LIMIT {
        errors.push(ValidationError::new(
            "submission.max_in_flight",
            format!("must be between 1 and {MAX_IN_FLIGHT_LIMIT}"),
        ));
    }

    if submission.max_error_entries == 0 {
        errors.push(ValidationError::new(
            "submission.max_error_entries",
            "at least one error entry must be kept",
        ));
    }

    if config.metrics.enabled && config.metrics.listen_addr.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "metrics.listen_addr",
            format!(
                "invalid socket address '{}'",
                config.metrics.listen_addr
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        Err(ConfigError::ValidationError(error_messages.join("; ")))
    }
}

fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new(
            "logging.level",
            format!(
                "invalid log level '{level}', must be one of: trace, debug, info, warn, error"
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("logging.level"));
    }

    #[test]
    fn test_zero_max_in_flight() {
        let mut config = AppConfig::default();
        config.submission.max_in_flight = 0;

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("submission.max_in_flight"));
    }

    #[test]
    fn test_bad_metrics_addr_ignored_when_disabled() {
        let mut config = AppConfig::default();
        config.metrics.listen_addr = "not-an-address".to_string();
        assert!(validate_config(&config).is_err());

        config.metrics.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_errors_are_aggregated() {
        let mut config = AppConfig::default();
        config.validation.max_quantity = 0;
        config.submission.max_error_entries = 0;

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("validation.max_quantity"));
        assert!(err.contains("submission.max_error_entries"));
        assert!(err.contains("; "));
    }
}
