//! # Tag Telemetry
//!
//! Logging and metrics for the tag registry.
//!
//! ## Components
//!
//! - Structured logs through `tracing-subscriber` (pretty or JSON)
//! - Prometheus counters and histograms for registry actions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tag_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TAG_SERVICE_NAME` | `tag-registry` | Service name in logs |
//! | `TAG_LOG_LEVEL` | `info` | Log level filter |
//! | `TAG_JSON_LOGS` | `false` | JSON log lines |
//! | `TAG_ENVIRONMENT` | `dev` | Deployment name |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, StructuredLogger};
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, AUTH_DENIALS, CAS_CONFLICTS,
    COLLABORATOR_RETRIES, OPERATION_DURATION, TAG_INVOCATIONS, TAG_OPERATIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize logger: {0}")]
    LoggerInit(String),

    /// Metric registration or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// A configuration value was rejected.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    let logger = init_logging(&config)?;

    Ok(TelemetryGuard {
        _logger: logger,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _logger: StructuredLogger,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Record the outcome of a registry action.
#[macro_export]
macro_rules! record_outcome {
    ($operation:expr, $outcome:expr) => {
        $crate::metrics::TAG_OPERATIONS
            .with_label_values(&[$operation, $outcome])
            .inc()
    };
}
