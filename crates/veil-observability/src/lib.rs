//! Veil Observability
//!
//! This crate provides observability features:
//! - Structured logging setup (tracing-subscriber)
//! - Pipeline metrics (Prometheus)

pub mod logging;
pub mod metrics;

pub use logging::{LoggingConfig, init_logging};
pub use metrics::PipelineMetrics;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
