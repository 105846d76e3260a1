//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Fetch stage (attempts, stall retries)
//! - Encoder gate and transcodes (slots, queue, encode results and duration)
//! - Jobs (terminal outcomes) and status message delivery

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Fetch Metrics
// =============================================================================

/// Fetch tool runs by result.
pub static FETCH_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tuberecode_fetch_attempts_total",
            "Total fetch tool runs",
        ),
        &["result"], // "completed", "stalled", "no_metadata", "tool_failed", ...
    )
    .unwrap()
});

/// Retries after a stalled download.
pub static FETCH_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tuberecode_fetch_retries_total",
        "Fetches restarted after the stall timeout",
    )
    .unwrap()
});

// =============================================================================
// Encoder Metrics
// =============================================================================

/// Encoder slots currently held.
pub static ENCODERS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("tuberecode_encoders_active", "Encoder slots in use").unwrap()
});

/// Jobs waiting for an encoder slot.
pub static ENCODERS_QUEUED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tuberecode_encoders_queued",
        "Jobs waiting for an encoder slot",
    )
    .unwrap()
});

/// Transcodes by strategy and result.
pub static ENCODES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tuberecode_encodes_total", "Total transcodes"),
        &["strategy", "result"],
    )
    .unwrap()
});

/// Time spent holding an encoder slot.
pub static ENCODE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tuberecode_encode_duration_seconds",
            "Duration of transcodes",
        )
        .buckets(vec![10.0, 30.0, 60.0, 300.0, 600.0, 1800.0, 3600.0, 7200.0]),
        &["strategy"],
    )
    .unwrap()
});

// =============================================================================
// Job Metrics
// =============================================================================

/// Finished jobs by outcome.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tuberecode_jobs_total", "Total finished jobs"),
        &["outcome"], // "transcoded", "skipped", "fetch_failed", "transcode_failed", "crashed"
    )
    .unwrap()
});

/// Status message updates that could not be delivered.
pub static STATUS_SINK_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tuberecode_status_sink_failures_total",
        "Status updates that failed to reach the chat",
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Fetch
        Box::new(FETCH_ATTEMPTS.clone()),
        Box::new(FETCH_RETRIES.clone()),
        // Encoder
        Box::new(ENCODERS_ACTIVE.clone()),
        Box::new(ENCODERS_QUEUED.clone()),
        Box::new(ENCODES_TOTAL.clone()),
        Box::new(ENCODE_DURATION.clone()),
        // Jobs
        Box::new(JOBS_TOTAL.clone()),
        Box::new(STATUS_SINK_FAILURES.clone()),
    ]
}
