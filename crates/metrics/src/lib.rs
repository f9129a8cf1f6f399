//! Metrics and monitoring for batch order submission
//!
//! This crate provides metrics collection and log setup for tracking batch
//! runs and the individual order submissions they issue.
//!
//! # Features
//!
//! - Prometheus metrics exposition
//! - HTTP endpoint for metrics scraping
//! - Tracing initialisation with an error-counting layer
//! - Correlated spans per batch run
//!
//! # Example
//!
//! ```no_run
//! use order_batch_metrics::{MetricsCollector, MetricsServer};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let collector = Arc::new(MetricsCollector::new());
//!
//!     collector.record_run_started(12);
//!
//!     let server = MetricsServer::new(collector.clone(), "0.0.0.0:9090".to_string());
//!     server.serve().await.unwrap();
//! }
//! ```

pub mod collector;
pub mod http;
pub mod metrics;
pub mod tracing;

pub use collector::{MetricsCollector, MetricsError};
pub use http::{MetricsServer, MetricsServerError};
pub use tracing::{
    init_tracing, CorrelationId, MetricsLayer, RunSpan, TracingError, TracingOptions,
    DEFAULT_FILTER,
};
