//! Prometheus metrics for the market maker.
//!
//! Tracks per-cycle outcomes and the risk inputs that shaped each decision.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a startup bug. These panics only occur
//! during static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram, register_int_counter,
    register_int_gauge_vec, CounterVec, Gauge, Histogram, IntCounter, IntGaugeVec,
};

/// Decision cycles by outcome.
/// Labels: outcome (ladder/flatten/skipped_timeout/skipped_error/submit_failed/submit_timeout)
pub static CYCLES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pmm_cycles_total",
        "Total decision cycles by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Risk ratio from the latest evaluated cycle.
pub static RISK_RATIO: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("pmm_risk_ratio", "Risk ratio of the latest cycle").unwrap()
});

/// Skew from the latest evaluated cycle.
pub static SKEW: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("pmm_skew", "Target-size skew of the latest cycle").unwrap()
});

/// Order intents in the latest ladder.
/// Labels: side (long/short)
pub static LADDER_INTENTS: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "pmm_ladder_intents",
        "Order intents in the latest ladder",
        &["side"]
    )
    .unwrap()
});

/// Ladders emitted by quote mode.
/// Labels: mode (first_entry/degraded/risk_adjusted/floating)
pub static LADDERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pmm_ladders_total",
        "Total ladders emitted by quote mode",
        &["mode"]
    )
    .unwrap()
});

/// Emergency flattens issued.
pub static FLATTEN_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("pmm_flatten_total", "Total emergency flatten instructions").unwrap()
});

/// Wall time of one cycle (fetch + evaluate + submit) in milliseconds.
pub static CYCLE_LATENCY_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "pmm_cycle_latency_ms",
        "Decision cycle latency in milliseconds",
        vec![1.0, 5.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 12000.0]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a finished cycle.
    pub fn cycle_completed(outcome: &str, latency_ms: f64) {
        CYCLES_TOTAL.with_label_values(&[outcome]).inc();
        CYCLE_LATENCY_MS.observe(latency_ms);
    }

    /// Record the risk inputs of an evaluated cycle.
    pub fn risk_observed(risk_ratio: f64, skew: f64) {
        RISK_RATIO.set(risk_ratio);
        SKEW.set(skew);
    }

    /// Record an emitted ladder.
    pub fn ladder_emitted(mode: &str, bids: usize, asks: usize) {
        LADDERS_TOTAL.with_label_values(&[mode]).inc();
        LADDER_INTENTS
            .with_label_values(&["long"])
            .set(i64::try_from(bids).unwrap_or(i64::MAX));
        LADDER_INTENTS
            .with_label_values(&["short"])
            .set(i64::try_from(asks).unwrap_or(i64::MAX));
    }

    /// Record an emergency flatten.
    pub fn flatten_issued() {
        FLATTEN_TOTAL.inc();
        LADDER_INTENTS.with_label_values(&["long"]).set(0);
        LADDER_INTENTS.with_label_values(&["short"]).set(0);
    }
}
