//! ---
//! rack_section: "01-core-functionality"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Rollout, convergence, and local lifecycle engine."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec, TextEncoder};

static ROLLOUT_OUTCOMES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "rack_rollout_outcomes_total",
        "Terminal outcomes observed while supervising rack rollouts",
        &["outcome"]
    )
    .expect("metric registration to succeed")
});

/// Terminal outcome labels recorded by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutMetric {
    /// Back to running cleanly.
    Converged,
    /// Back to running after a rollback.
    RolledBack,
    /// Deadline elapsed.
    Timeout,
    /// A status poll failed.
    PollError,
}

impl RolloutMetric {
    /// Label value.
    pub fn as_str(&self) -> &'static str {
        match self {
            RolloutMetric::Converged => "converged",
            RolloutMetric::RolledBack => "rolled_back",
            RolloutMetric::Timeout => "timeout",
            RolloutMetric::PollError => "poll_error",
        }
    }
}

pub(crate) fn record_rollout(outcome: RolloutMetric) {
    ROLLOUT_OUTCOMES_TOTAL
        .with_label_values(&[outcome.as_str()])
        .inc();
}

/// Current count for one outcome label.
pub fn rollout_outcome_count(outcome: RolloutMetric) -> u64 {
    ROLLOUT_OUTCOMES_TOTAL
        .with_label_values(&[outcome.as_str()])
        .get()
}

/// Text exposition of every registered metric.
pub fn render() -> String {
    let families = prometheus::gather();
    TextEncoder::new()
        .encode_to_string(&families)
        .unwrap_or_default()
}
