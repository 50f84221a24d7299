//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Export and summary operations (counts by result, duration)
//! - OpenSCAD invocations that hit the deadline

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

/// Render operations total by operation, format, and result.
pub static RENDERS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("scadsrv_renders_total", "Total export and summary operations"),
        &["operation", "format", "result"], // result: "success" or an error kind
    )
    .unwrap()
});

/// Render duration in seconds.
pub static RENDER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "scadsrv_render_duration_seconds",
            "Duration of export and summary operations",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["operation"],
    )
    .unwrap()
});

/// OpenSCAD invocations killed at the deadline.
pub static OPENSCAD_TIMEOUTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "scadsrv_openscad_timeouts_total",
        "OpenSCAD invocations killed after exceeding the timeout",
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(RENDERS_TOTAL.clone()),
        Box::new(RENDER_DURATION.clone()),
        Box::new(OPENSCAD_TIMEOUTS.clone()),
    ]
}
