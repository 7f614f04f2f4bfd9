// Prometheus metrics for result submissions and bracket progression.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::model::{BracketSide, BracketSlot, Stage};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gauges ───────────────────────────────────────────────────────

    /// Current stage: 0 = group, 1 = playoffs.
    pub static ref STAGE: IntGauge =
        IntGauge::new("battlezone_stage", "Current tournament stage (0 group, 1 playoffs)").unwrap();

    // ── Counters ─────────────────────────────────────────────────────

    /// Accepted results, by kind (new, correction).
    pub static ref RESULTS_SUBMITTED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("battlezone_results_submitted_total", "Accepted match results"),
        &["kind"],
    )
    .unwrap();

    /// Rejected submissions, by reason.
    pub static ref RESULTS_REJECTED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("battlezone_results_rejected_total", "Rejected match results"),
        &["reason"],
    )
    .unwrap();

    /// Playoff matches generated, by bracket side.
    pub static ref BRACKET_MATCHES_GENERATED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "battlezone_bracket_matches_generated_total",
            "Playoff matches generated by bracket progression",
        ),
        &["bracket"],
    )
    .unwrap();

    /// Snapshot writes rejected because another writer got there first.
    pub static ref SNAPSHOT_CONFLICTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("battlezone_snapshot_conflicts_total", "Snapshot version conflicts"),
        &["operation"],
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// Time spent inside one engine submission, in milliseconds.
    pub static ref SUBMIT_DURATION_MS: Histogram = Histogram::with_opts(
        HistogramOpts::new("battlezone_submit_duration_ms", "Engine time per submission in ms")
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]),
    )
    .unwrap();
}

static REGISTER: Once = Once::new();

/// Register all metrics with the custom registry. Safe to call more than once.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(STAGE.clone()),
            Box::new(RESULTS_SUBMITTED_TOTAL.clone()),
            Box::new(RESULTS_REJECTED_TOTAL.clone()),
            Box::new(BRACKET_MATCHES_GENERATED_TOTAL.clone()),
            Box::new(SNAPSHOT_CONFLICTS_TOTAL.clone()),
            Box::new(SUBMIT_DURATION_MS.clone()),
        ];

        for c in collectors {
            if let Err(e) = REGISTRY.register(c) {
                tracing::warn!("Failed to register metric: {e}");
            }
        }
    });
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Label for a bracket side.
pub fn bracket_label(slot: BracketSlot) -> &'static str {
    match slot.side() {
        BracketSide::Upper => "upper",
        BracketSide::Lower => "lower",
        BracketSide::Final => "final",
    }
}

pub fn set_stage(stage: Stage) {
    STAGE.set(match stage {
        Stage::Group => 0,
        Stage::Playoffs => 1,
    });
}
