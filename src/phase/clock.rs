//! Phase clock
//!
//! Pure mapping from elapsed ticks to the active phase. Nothing is retained
//! between calls; the caller supplies the elapsed time every time.
//!
//! Boundary rule: a tick count that lands exactly on the end of phase `i`
//! belongs to phase `i + 1`. Elapsed time at or past the total duration
//! selects the last phase and reports completion.

use crate::catalog::Phase;

/// Result of [`compute_phase`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseProgress {
    /// Index of the active phase, always within bounds for a non-empty list
    pub phase_index: usize,
    /// Overall progress in `[0, 1]`
    pub progress_fraction: f64,
    /// Ticks left until the end of the last phase
    pub remaining: u64,
    /// Whether elapsed time has reached the total duration
    pub is_complete: bool,
}

/// Returns the sum of all phase durations, saturating at `u64::MAX`.
///
/// Validated definitions never saturate; see [`checked_total_duration`].
#[must_use]
pub fn total_duration(phases: &[Phase]) -> u64 {
    phases
        .iter()
        .fold(0u64, |acc, p| acc.saturating_add(p.duration))
}

/// Returns the sum of all phase durations, or `None` if it overflows `u64`.
#[must_use]
pub fn checked_total_duration(phases: &[Phase]) -> Option<u64> {
    phases
        .iter()
        .try_fold(0u64, |acc, p| acc.checked_add(p.duration))
}

/// Computes the active phase and overall progress for `elapsed` ticks.
///
/// An empty phase list is reported as complete at index 0 with full
/// progress.
#[must_use]
pub fn compute_phase(phases: &[Phase], elapsed: u64) -> PhaseProgress {
    let total = total_duration(phases);
    let last = phases.len().saturating_sub(1);

    if elapsed >= total {
        return PhaseProgress {
            phase_index: last,
            progress_fraction: 1.0,
            remaining: 0,
            is_complete: true,
        };
    }

    let mut cumulative = 0u64;
    let mut phase_index = last;
    for (i, phase) in phases.iter().enumerate() {
        cumulative = cumulative.saturating_add(phase.duration);
        if elapsed < cumulative {
            phase_index = i;
            break;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let progress_fraction = (elapsed as f64 / total as f64).min(1.0);

    PhaseProgress {
        phase_index,
        progress_fraction,
        remaining: total - elapsed,
        is_complete: false,
    }
}

/// Returns the tick at which phase `index` starts.
///
/// Indices past the end are clamped to the last phase.
#[must_use]
pub fn phase_start(phases: &[Phase], index: usize) -> u64 {
    let index = index.min(phases.len().saturating_sub(1));
    total_duration(&phases[..index])
}

/// Returns the elapsed tick count a manual jump to phase `index` lands on.
///
/// A jump lands one tick into the target phase (start + 1), so the display
/// never shows zero time spent in the phase just selected. Clamped to the
/// total duration for one-tick phases at the end of the list.
#[must_use]
pub fn jump_offset(phases: &[Phase], index: usize) -> u64 {
    phase_start(phases, index)
        .saturating_add(1)
        .min(total_duration(phases))
}
