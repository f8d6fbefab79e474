//! Metrics and observability utilities
//!
//! Records pipeline activity through the `metrics` facade with
//! standardized naming conventions. Binaries call [`install_recorder`]
//! before [`register_metrics`]; library users may install their own
//! recorder, and without one every call is a no-op.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Metrics prefix for all WikiGap metrics
pub const METRICS_PREFIX: &str = "wikigap";

/// Histogram buckets for upstream fetch latency (in seconds)
/// The per-call timeout (10s) is the last bucket
pub const FETCH_BUCKETS: &[f64] = &[
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s - call timeout
];

fn prometheus_builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Suffix("fetch_duration_seconds".to_string()),
        FETCH_BUCKETS,
    )
}

/// Install the Prometheus recorder as the global recorder.
///
/// The returned handle renders the text exposition format on demand.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = prometheus_builder()?.install_recorder()?;
    Ok(handle)
}

/// Register all metric descriptions
pub fn register_metrics() {
    // Run metrics
    describe_counter!(
        format!("{}_runs_total", METRICS_PREFIX),
        Unit::Count,
        "Total ranking runs by outcome"
    );

    describe_histogram!(
        format!("{}_run_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end ranking run latency in seconds"
    );

    // Existence filter metrics
    describe_counter!(
        format!("{}_existence_checks_total", METRICS_PREFIX),
        Unit::Count,
        "Existence checks by verdict"
    );

    // Collector metrics
    describe_histogram!(
        format!("{}_fetch_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Upstream metadata fetch latency in seconds"
    );

    describe_counter!(
        format!("{}_fetch_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Upstream metadata fetch failures by source"
    );

    describe_counter!(
        format!("{}_candidates_dropped_total", METRICS_PREFIX),
        Unit::Count,
        "Candidates removed before ranking, by reason"
    );

    tracing::info!("Metrics registered");
}

/// Helper to time one upstream fetch
pub struct FetchTimer {
    start: Instant,
    source: &'static str,
}

impl FetchTimer {
    /// Start timing a fetch from `source`
    pub fn start(source: &'static str) -> Self {
        Self {
            start: Instant::now(),
            source,
        }
    }

    /// Record completion; failures are also counted
    pub fn finish(self, success: bool) {
        let duration = self.start.elapsed().as_secs_f64();

        histogram!(
            format!("{}_fetch_duration_seconds", METRICS_PREFIX),
            "source" => self.source
        )
        .record(duration);

        if !success {
            counter!(
                format!("{}_fetch_failures_total", METRICS_PREFIX),
                "source" => self.source
            )
            .increment(1);
        }
    }
}

/// Helper to record an existence verdict
pub fn record_existence(verdict: &str) {
    counter!(
        format!("{}_existence_checks_total", METRICS_PREFIX),
        "verdict" => verdict.to_string()
    )
    .increment(1);
}

/// Helper to record candidates removed before ranking
pub fn record_dropped(reason: &'static str, count: usize) {
    counter!(
        format!("{}_candidates_dropped_total", METRICS_PREFIX),
        "reason" => reason
    )
    .increment(count as u64);
}

/// Helper to record a finished run
pub fn record_run(duration_secs: f64, outcome: &'static str) {
    counter!(
        format!("{}_runs_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(format!("{}_run_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}
