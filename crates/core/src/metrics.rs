//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Acquisition runs (outcomes, duration, candidates)
//! - Provider searches and downloads
//! - Language verification
//! - Live subtitle switching

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Acquisition Metrics
// =============================================================================

/// Acquisition runs by final status.
pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("plexsubs_runs_total", "Total acquisition runs"),
        &["status"], // "done", "already_satisfied", "no_subtitle_found", ...
    )
    .unwrap()
});

/// Acquisition run duration in seconds.
pub static RUN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "plexsubs_run_duration_seconds",
            "Duration of one acquisition run",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["status"],
    )
    .unwrap()
});

/// Usable candidates per language search.
pub static CANDIDATES_FOUND: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "plexsubs_candidates_found",
            "Number of usable candidates per language search",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
    )
    .unwrap()
});

/// Languages finished, by outcome.
pub static LANGUAGE_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "plexsubs_language_outcomes_total",
            "Per-language acquisition outcomes",
        ),
        &["language", "outcome"],
    )
    .unwrap()
});

// =============================================================================
// Provider Metrics
// =============================================================================

/// Provider searches by result.
pub static PROVIDER_SEARCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("plexsubs_provider_searches_total", "Total provider searches"),
        &["provider", "result"], // "success", "error"
    )
    .unwrap()
});

/// Download attempts by result.
pub static DOWNLOAD_ATTEMPTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "plexsubs_download_attempts_total",
            "Total subtitle download attempts",
        ),
        &["result"], // "success", "transient", "permanent"
    )
    .unwrap()
});

/// Downloaded subtitles rejected by language verification.
pub static VERIFICATION_REJECTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "plexsubs_verification_rejections_total",
            "Subtitles rejected by language verification",
        ),
        &["language"],
    )
    .unwrap()
});

// =============================================================================
// Switch Metrics
// =============================================================================

/// Live switch outcomes.
pub static SWITCH_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "plexsubs_switch_outcomes_total",
            "Live subtitle switch outcomes",
        ),
        &["outcome"], // "switched", "session_ended", "track_never_appeared", ...
    )
    .unwrap()
});

/// Time until a live switch finished, in seconds.
pub static SWITCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "plexsubs_switch_duration_seconds",
            "Duration of the live switch loop",
        )
        .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 15.0, 20.0, 30.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(RUNS_TOTAL.clone()),
        Box::new(RUN_DURATION.clone()),
        Box::new(CANDIDATES_FOUND.clone()),
        Box::new(LANGUAGE_OUTCOMES.clone()),
        Box::new(PROVIDER_SEARCHES.clone()),
        Box::new(DOWNLOAD_ATTEMPTS_TOTAL.clone()),
        Box::new(VERIFICATION_REJECTIONS.clone()),
        Box::new(SWITCH_OUTCOMES.clone()),
        Box::new(SWITCH_DURATION.clone()),
    ]
}
