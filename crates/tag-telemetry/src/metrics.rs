//! Prometheus metrics for the tag registry.
//!
//! All metrics follow the naming convention: `tag_registry_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., invocations_total)
//! - **Histogram**: Distribution of values (e.g., operation_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, HistogramVec,
    Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Registry actions by outcome
    pub static ref TAG_OPERATIONS: CounterVec = CounterVec::new(
        Opts::new("tag_registry_operations_total", "Total registry actions"),
        &["operation", "outcome"]  // outcome: "ok" or the failure kind
    ).expect("metric creation failed");

    /// Successful tag invocations
    pub static ref TAG_INVOCATIONS: Counter = Counter::new(
        "tag_registry_invocations_total",
        "Total number of successful tag invocations"
    ).expect("metric creation failed");

    /// Authorization denials by reason
    pub static ref AUTH_DENIALS: CounterVec = CounterVec::new(
        Opts::new("tag_registry_denials_total", "Total authorization denials"),
        &["reason"]
    ).expect("metric creation failed");

    /// Automatic retries of collaborator calls
    pub static ref COLLABORATOR_RETRIES: CounterVec = CounterVec::new(
        Opts::new(
            "tag_registry_collaborator_retries_total",
            "Collaborator calls retried after a transient failure"
        ),
        &["operation"]
    ).expect("metric creation failed");

    /// Lost compare-and-swap races on ownership updates
    pub static ref CAS_CONFLICTS: Counter = Counter::new(
        "tag_registry_cas_conflicts_total",
        "Ownership updates rejected by the store's compare-and-swap"
    ).expect("metric creation failed");

    /// Action latency
    pub static ref OPERATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "tag_registry_operation_duration_seconds",
            "Time spent serving a registry action"
        ).buckets(exponential_buckets(0.0005, 2.0, 14).unwrap()),
        &["operation"]
    ).expect("metric creation failed");
}

/// Handle to the metrics registry.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(TAG_OPERATIONS.clone()),
        Box::new(TAG_INVOCATIONS.clone()),
        Box::new(AUTH_DENIALS.clone()),
        Box::new(COLLABORATOR_RETRIES.clone()),
        Box::new(CAS_CONFLICTS.clone()),
        Box::new(OPERATION_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing a registry action. Observation happens on drop.
#[macro_export]
macro_rules! time_operation {
    ($operation:expr) => {
        $crate::metrics::HistogramTimer::new(
            &$crate::metrics::OPERATION_DURATION.with_label_values(&[$operation]),
        )
    };
}
