use std::sync::Arc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::collector::MetricsCollector;

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info,order_batch=debug";

/// Output options for [`init_tracing`]
#[derive(Debug, Clone)]
pub struct TracingOptions {
    /// Filter directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            json: true,
        }
    }
}

/// Initialize the global subscriber with metrics integration
pub fn init_tracing(
    options: &TracingOptions,
    collector: Arc<MetricsCollector>,
) -> Result<(), TracingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&options.filter))
        .map_err(|e| TracingError::InvalidFilter(e.to_string()))?;

    let json_layer = options.json.then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .json()
    });
    let text_layer = (!options.json).then(|| fmt::layer().with_target(true).with_level(true));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(MetricsLayer::new(collector))
        .try_init()
        .map_err(|e| TracingError::InitError(e.to_string()))?;

    Ok(())
}

/// Tracing layer that counts error-level events
pub struct MetricsLayer {
    collector: Arc<MetricsCollector>,
}

impl MetricsLayer {
    pub fn new(collector: Arc<MetricsCollector>) -> Self {
        Self { collector }
    }
}

impl<S> Layer<S> for MetricsLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() == Level::ERROR {
            self.collector.record_error_event(metadata.target());
        }
    }
}

/// Correlation ID for tracking one run across components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(uuid::Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Span context for a batch run
#[derive(Debug, Clone)]
pub struct RunSpan {
    pub correlation_id: CorrelationId,
    pub run_id: String,
    pub mode: String,
    pub size: usize,
}

impl RunSpan {
    pub fn new(run_id: impl Into<String>, mode: impl Into<String>, size: usize) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            run_id: run_id.into(),
            mode: mode.into(),
            size,
        }
    }

    /// Span to instrument the run's task with
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "batch_run",
            correlation_id = %self.correlation_id,
            run_id = %self.run_id,
            mode = %self.mode,
            size = self.size,
        )
    }

    /// Enter the span on the current thread
    pub fn enter(&self) -> tracing::span::EnteredSpan {
        self.span().entered()
    }
}

/// Tracing error types
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("tracing initialization error: {0}")]
    InitError(String),

    #[error("invalid log filter: {0}")]
    InvalidFilter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_generation() {
        let id1 = CorrelationId::new();
        let id2 = CorrelationId::new();

        assert_ne!(id1, id2);
        assert!(id1.as_str().len() == 36);
    }

    #[test]
    fn test_run_span_creation() {
        let span = RunSpan::new("run-1", "sequential", 5);

        assert_eq!(span.run_id, "run-1");
        assert_eq!(span.mode, "sequential");
        assert_eq!(span.size, 5);
    }

    #[test]
    fn test_default_options() {
        let options = TracingOptions::default();
        assert_eq!(options.filter, DEFAULT_FILTER);
        assert!(options.json);
    }

    #[test]
    fn test_metrics_layer_counts_errors() {
        let collector = Arc::new(MetricsCollector::new());
        let subscriber =
            tracing_subscriber::registry().with(MetricsLayer::new(collector.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(target: "order_batch::layer_test", "submission pipeline broke");
        });

        let metrics = collector.export_metrics().unwrap();
        assert!(metrics.contains("order_batch::layer_test"));
    }
}
