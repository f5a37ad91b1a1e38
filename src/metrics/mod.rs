//! Metrics collection for observability

use prometheus::{
    CounterVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    register_counter_vec_with_registry,
    register_histogram_vec_with_registry, register_histogram_with_registry,
};
use std::sync::Arc;
use once_cell::sync::Lazy;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Check outcomes
    pub checks: CounterVec,
    pub check_failures: CounterVec,
    pub pipeline_duration: Histogram,

    // Evidence selection
    pub fetch_outcomes: CounterVec,
    pub evidence_kept: Histogram,

    // Oracle calls
    pub oracle_requests: CounterVec,
    pub oracle_duration: HistogramVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();

        let checks = register_counter_vec_with_registry!(
            Opts::new("claim_checks_total", "Completed claim checks by verdict"),
            &["verdict"],
            registry
        )?;

        let check_failures = register_counter_vec_with_registry!(
            Opts::new("claim_check_failures_total", "Claim checks aborted by an upstream error"),
            &["kind"],
            registry
        )?;

        let pipeline_duration = register_histogram_with_registry!(
            HistogramOpts::new(
                "claim_check_duration_seconds",
                "Wall-clock duration of a full pipeline run"
            )
            .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 40.0, 60.0, 120.0]),
            registry
        )?;

        let fetch_outcomes = register_counter_vec_with_registry!(
            Opts::new("source_fetch_total", "Source page fetches by outcome"),
            &["outcome"],
            registry
        )?;

        let evidence_kept = register_histogram_with_registry!(
            HistogramOpts::new("evidence_kept", "Evidence passages kept per check")
                .buckets(vec![0.0, 1.0, 2.0, 4.0, 6.0, 8.0, 12.0]),
            registry
        )?;

        let oracle_requests = register_counter_vec_with_registry!(
            Opts::new("oracle_requests_total", "Oracle requests by oracle and status"),
            &["oracle", "status"],
            registry
        )?;

        let oracle_duration = register_histogram_vec_with_registry!(
            "oracle_request_duration_seconds",
            "Oracle request duration in seconds",
            &["oracle"],
            registry
        )?;

        Ok(Self {
            registry,
            checks,
            check_failures,
            pipeline_duration,
            fetch_outcomes,
            evidence_kept,
            oracle_requests,
            oracle_duration,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a completed check
    pub fn record_check(&self, verdict: &str, evidence: usize, seconds: f64) {
        self.checks.with_label_values(&[verdict]).inc();
        self.evidence_kept.observe(evidence as f64);
        self.pipeline_duration.observe(seconds);
    }

    /// Record a check aborted by an upstream error
    pub fn record_check_failure(&self, kind: &str) {
        self.check_failures.with_label_values(&[kind]).inc();
    }

    /// Record the outcome of one source fetch
    pub fn record_fetch(&self, outcome: &str) {
        self.fetch_outcomes.with_label_values(&[outcome]).inc();
    }

    /// Record an oracle call
    pub fn record_oracle(&self, oracle: &str, success: bool, seconds: f64) {
        let status = if success { "success" } else { "error" };
        self.oracle_requests.with_label_values(&[oracle, status]).inc();
        self.oracle_duration.with_label_values(&[oracle]).observe(seconds);
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}
