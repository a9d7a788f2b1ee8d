//! Metrics collection for `moodharmony`.
//!
//! Provides Prometheus-compatible metrics with label cardinality protection
//! and typed convenience functions for recording session measurements.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::MoodHarmonyError;
use crate::session::StopReason;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Maximum length for transition and phase labels.
///
/// Both come from catalog files and are used directly as Prometheus labels.
const MAX_LABEL_LEN: usize = 64;

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`.  When `None`, the recorder is installed without
/// an HTTP endpoint.
///
/// # Errors
///
/// Returns `MoodHarmonyError::Io` if the recorder or HTTP listener
/// cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), MoodHarmonyError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| MoodHarmonyError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "moodharmony_sessions_started_total",
        "Sessions started or restored"
    );
    describe_counter!(
        "moodharmony_sessions_completed_total",
        "Sessions that reached their total duration"
    );
    describe_counter!(
        "moodharmony_sessions_stopped_total",
        "Sessions torn down before evaluation, by reason"
    );
    describe_counter!(
        "moodharmony_progress_saves_total",
        "Save attempts by outcome"
    );
    describe_counter!(
        "moodharmony_phase_changes_total",
        "Active phase changes"
    );
    describe_counter!(
        "moodharmony_evaluations_total",
        "Evaluations by outcome"
    );
    describe_histogram!(
        "moodharmony_evaluation_rating",
        "Submitted effectiveness ratings"
    );
    describe_gauge!(
        "moodharmony_session_elapsed_ticks",
        "Elapsed ticks of the active session"
    );
}

/// Records a session start.
pub fn record_session_started(transition_id: &str) {
    counter!(
        "moodharmony_sessions_started_total",
        "transition" => sanitize_label(transition_id)
    )
    .increment(1);
}

/// Records a session completion.
pub fn record_session_completed(transition_id: &str) {
    counter!(
        "moodharmony_sessions_completed_total",
        "transition" => sanitize_label(transition_id)
    )
    .increment(1);
}

/// Records a session teardown.
pub fn record_session_stopped(reason: StopReason) {
    let reason = match reason {
        StopReason::Stopped => "stopped",
        StopReason::Abandoned => "abandoned",
        StopReason::Saved => "saved",
    };
    counter!("moodharmony_sessions_stopped_total", "reason" => reason).increment(1);
}

/// Records a save attempt.
pub fn record_progress_saved(persisted: bool) {
    let outcome = if persisted { "persisted" } else { "failed" };
    counter!("moodharmony_progress_saves_total", "outcome" => outcome).increment(1);
}

/// Records a change of active phase.
pub fn record_phase_change(phase_name: &str) {
    counter!(
        "moodharmony_phase_changes_total",
        "phase" => sanitize_label(phase_name)
    )
    .increment(1);
}

/// Records a submitted evaluation.
pub fn record_evaluation_submitted(rating: u8) {
    counter!("moodharmony_evaluations_total", "outcome" => "submitted").increment(1);
    histogram!("moodharmony_evaluation_rating").record(f64::from(rating));
}

/// Records a deferred evaluation.
pub fn record_evaluation_deferred() {
    counter!("moodharmony_evaluations_total", "outcome" => "deferred").increment(1);
}

/// Sets the elapsed-ticks gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_elapsed(ticks: u64) {
    gauge!("moodharmony_session_elapsed_ticks").set(ticks as f64);
}

/// Sanitizes a catalog-supplied name for use as a metrics label.
///
/// Truncates to [`MAX_LABEL_LEN`] characters and replaces any characters
/// invalid in Prometheus labels with underscores.
fn sanitize_label(name: &str) -> String {
    name.chars()
        .take(MAX_LABEL_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
