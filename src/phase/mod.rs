//! Phase clock
//!
//! Deterministic phase arithmetic shared by the session controller and any
//! display collaborator.
//!
//! # Architecture
//!
//! - [`compute_phase`]: Elapsed ticks → active phase, progress, remaining
//! - [`jump_offset`]: Landing tick for a manual phase jump
//! - [`format_time`]: `M:SS` rendering

pub mod clock;
pub mod format;

pub use clock::{
    PhaseProgress, checked_total_duration, compute_phase, jump_offset, phase_start,
    total_duration,
};
pub use format::format_time;
