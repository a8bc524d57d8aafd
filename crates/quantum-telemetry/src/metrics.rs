//! Prometheus metrics for the pre-handle pipeline.
//!
//! All metrics follow the naming convention: `qc_prehandle_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., results_total)
//! - **Histogram**: Distribution of values (e.g., transaction_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // RESULT METRICS
    // =========================================================================

    /// Results produced, labelled by terminal status
    pub static ref PREHANDLE_RESULTS: CounterVec = CounterVec::new(
        Opts::new("qc_prehandle_results_total", "Pre-handle results by status"),
        &["status"]  // SO_FAR_SO_GOOD / NODE_DUE_DILIGENCE_FAILURE / PRE_HANDLE_FAILURE / UNKNOWN_FAILURE
    ).expect("metric creation failed");

    /// Previous results returned without reprocessing
    pub static ref PREHANDLE_REUSED: Counter = Counter::new(
        "qc_prehandle_reused_total",
        "Previous pre-handle results reused verbatim"
    ).expect("metric creation failed");

    /// Panics caught while pre-handling a single transaction
    pub static ref PREHANDLE_PANICS: Counter = Counter::new(
        "qc_prehandle_panics_total",
        "Panics contained by the per-transaction fault barrier"
    ).expect("metric creation failed");

    /// Batches processed
    pub static ref PREHANDLE_BATCHES: Counter = Counter::new(
        "qc_prehandle_batches_total",
        "Event batches pre-handled"
    ).expect("metric creation failed");

    /// Time spent pre-handling one transaction
    pub static ref PREHANDLE_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "qc_prehandle_transaction_duration_seconds",
            "Time spent pre-handling a single transaction"
        ).buckets(exponential_buckets(0.00001, 2.0, 16).expect("valid bucket layout"))
    ).expect("metric creation failed");

    // =========================================================================
    // DEDUPLICATION & SIGNATURE METRICS
    // =========================================================================

    /// Transaction ids registered for deduplication
    pub static ref DEDUP_REGISTRATIONS: CounterVec = CounterVec::new(
        Opts::new("qc_prehandle_dedup_registrations_total", "Deduplication registrations"),
        &["outcome"]  // outcome: new/duplicate
    ).expect("metric creation failed");

    /// Keys submitted for asynchronous signature verification
    pub static ref SIGNATURE_SUBMISSIONS: Counter = Counter::new(
        "qc_prehandle_signature_submissions_total",
        "Keys and hollow accounts submitted for signature verification"
    ).expect("metric creation failed");
}

/// Handle for the metrics registry
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Results
        Box::new(PREHANDLE_RESULTS.clone()),
        Box::new(PREHANDLE_REUSED.clone()),
        Box::new(PREHANDLE_PANICS.clone()),
        Box::new(PREHANDLE_BATCHES.clone()),
        Box::new(PREHANDLE_DURATION.clone()),
        // Deduplication & signatures
        Box::new(DEDUP_REGISTRATIONS.clone()),
        Box::new(SIGNATURE_SUBMISSIONS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
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
