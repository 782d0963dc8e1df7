//! Prometheus metrics for resolver runs.
//!
//! This module provides metrics for:
//! - Probe calls against the cache handler
//! - Accepted releases and skipped candidates
//! - Run outcomes and durations

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Probe Metrics
// =============================================================================

/// Handler calls by method and status.
pub static PROBE_CALLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cachepick_probe_calls_total",
            "Total calls issued against the cache handler",
        ),
        &["method", "status"], // method: "batch", "live", "season_pack"; status: "ok" or error kind
    )
    .unwrap()
});

/// Handler call duration in seconds.
pub static PROBE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cachepick_probe_duration_seconds",
            "Duration of cache handler calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method"],
    )
    .unwrap()
});

// =============================================================================
// Selection Metrics
// =============================================================================

/// Accepted releases by verification source.
pub static RELEASES_ACCEPTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cachepick_releases_accepted_total",
            "Total releases accepted as cached",
        ),
        &["from"], // "api_batch", "api_live", "batch_pack_inspection"
    )
    .unwrap()
});

/// Candidates skipped before verification, by reason.
pub static CANDIDATES_SKIPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cachepick_candidates_skipped_total",
            "Total candidates skipped without a probe",
        ),
        &["reason"], // "irrelevant", "priority", "codec_cap", "quota_full", "resolution_cap"
    )
    .unwrap()
});

// =============================================================================
// Run Metrics
// =============================================================================

/// Finished runs by stop reason.
pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cachepick_runs_total", "Total resolver runs"),
        &["stop_reason"], // "completed", "early_exit", "cancelled"
    )
    .unwrap()
});

/// Run duration in seconds.
pub static RUN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("cachepick_run_duration_seconds", "Duration of resolver runs")
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["stop_reason"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Probes
        Box::new(PROBE_CALLS.clone()),
        Box::new(PROBE_DURATION.clone()),
        // Selection
        Box::new(RELEASES_ACCEPTED.clone()),
        Box::new(CANDIDATES_SKIPPED.clone()),
        // Runs
        Box::new(RUNS_TOTAL.clone()),
        Box::new(RUN_DURATION.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        PROBE_CALLS.with_label_values(&["batch", "ok"]).inc();
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"cachepick_probe_calls_total".to_string()));
    }
}
