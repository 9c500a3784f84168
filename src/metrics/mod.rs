//! Prometheus metrics for the catalog search service.
//!
//! Tracks operation outcomes, engine latency, bulk indexing throughput and
//! enrichment failures. Metrics live in a process-wide registry exposed at
//! `GET /metrics`.
//!
//! # Example
//! ```no_run
//! use catalog_search::metrics::OPERATIONS_TOTAL;
//!
//! OPERATIONS_TOTAL.with_label_values(&["search", "success"]).inc();
//! ```

use lazy_static::lazy_static;
use prometheus::{CounterVec, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

const NAMESPACE: &str = "catalog_search";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Operations handled by the dispatcher
    ///
    /// Labels: operation, outcome
    pub static ref OPERATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("operations_total", "Total number of dispatched operations")
            .namespace(NAMESPACE),
        &["operation", "outcome"]
    ).expect("Failed to create OPERATIONS_TOTAL metric");

    /// Engine request duration in seconds
    ///
    /// Labels: call
    pub static ref ENGINE_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "engine_request_duration_seconds",
            "Search engine request duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["call"]
    ).expect("Failed to create ENGINE_REQUEST_DURATION_SECONDS metric");

    /// Bulk requests sent
    ///
    /// Labels: index
    pub static ref BULK_FLUSHES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("bulk_flushes_total", "Total number of bulk requests sent")
            .namespace(NAMESPACE),
        &["index"]
    ).expect("Failed to create BULK_FLUSHES_TOTAL metric");

    /// Documents accepted by bulk requests
    ///
    /// Labels: index
    pub static ref DOCUMENTS_INDEXED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("documents_indexed_total", "Total number of documents indexed")
            .namespace(NAMESPACE),
        &["index"]
    ).expect("Failed to create DOCUMENTS_INDEXED_TOTAL metric");

    /// Hits whose enrichment failed and were returned without derived fields
    pub static ref ENRICHMENT_FAILURES_TOTAL: IntCounter = IntCounter::with_opts(
        Opts::new("enrichment_failures_total", "Total number of failed hit enrichments")
            .namespace(NAMESPACE)
    ).expect("Failed to create ENRICHMENT_FAILURES_TOTAL metric");
}

/// Register all metrics with the global registry
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(OPERATIONS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(ENGINE_REQUEST_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(BULK_FLUSHES_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(DOCUMENTS_INDEXED_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(ENRICHMENT_FAILURES_TOTAL.clone()))?;
    Ok(())
}

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        // Global registry: a second registration in the same process fails
        let _ = init_metrics();
        OPERATIONS_TOTAL.with_label_values(&["search", "success"]).inc();
        let output = gather_metrics();
        assert!(output.contains("catalog_search_operations_total"));
    }

    #[test]
    fn test_bulk_counters() {
        let before = BULK_FLUSHES_TOTAL.with_label_values(&["metrics-test"]).get();
        BULK_FLUSHES_TOTAL.with_label_values(&["metrics-test"]).inc();
        assert_eq!(BULK_FLUSHES_TOTAL.with_label_values(&["metrics-test"]).get(), before + 1);
    }
}
