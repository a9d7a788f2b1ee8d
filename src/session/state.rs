//! Session state representation
//!
//! One tagged enum holds everything the controller knows about the current
//! session. Public callers only ever see a [`SessionSnapshot`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::TransitionDefinition;
use crate::phase::{PhaseProgress, compute_phase};

use super::evaluation::EvaluationDraft;

/// Coarse session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No session
    Idle,
    /// Ticking
    Running,
    /// Frozen, resumable
    Paused,
    /// Reached the end, awaiting evaluation
    Completed,
}

impl SessionStatus {
    /// Returns the lowercase name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of an active session inside its transition.
#[derive(Debug, Clone)]
pub(crate) struct Progress {
    pub(crate) session_id: Uuid,
    pub(crate) definition: Arc<TransitionDefinition>,
    pub(crate) elapsed: u64,
    pub(crate) phase_index: usize,
    pub(crate) started_at: DateTime<Utc>,
}

impl Progress {
    pub(crate) fn new(definition: Arc<TransitionDefinition>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            definition,
            elapsed: 0,
            phase_index: 0,
            started_at: Utc::now(),
        }
    }

    /// Moves to `elapsed` (clamped to the total) and recomputes the phase.
    ///
    /// Returns the clock result and whether the phase index changed.
    pub(crate) fn set_elapsed(&mut self, elapsed: u64) -> (PhaseProgress, bool) {
        self.elapsed = elapsed.min(self.definition.total_duration());
        let clock = compute_phase(self.definition.phases(), self.elapsed);
        let changed = clock.phase_index != self.phase_index;
        self.phase_index = clock.phase_index;
        (clock, changed)
    }

    pub(crate) fn clock(&self) -> PhaseProgress {
        compute_phase(self.definition.phases(), self.elapsed)
    }
}

/// Controller state machine.
#[derive(Debug, Clone, Default)]
pub(crate) enum SessionState {
    #[default]
    Idle,
    Running(Progress),
    Paused(Progress),
    Completed {
        progress: Progress,
        evaluation: EvaluationDraft,
    },
}

impl SessionState {
    pub(crate) const fn status(&self) -> SessionStatus {
        match self {
            Self::Idle => SessionStatus::Idle,
            Self::Running(_) => SessionStatus::Running,
            Self::Paused(_) => SessionStatus::Paused,
            Self::Completed { .. } => SessionStatus::Completed,
        }
    }

    pub(crate) const fn progress(&self) -> Option<&Progress> {
        match self {
            Self::Idle => None,
            Self::Running(p) | Self::Paused(p) | Self::Completed { progress: p, .. } => Some(p),
        }
    }

    /// Progress of a running or paused session.
    pub(crate) const fn active(&self) -> Option<&Progress> {
        match self {
            Self::Running(p) | Self::Paused(p) => Some(p),
            Self::Idle | Self::Completed { .. } => None,
        }
    }

    pub(crate) const fn active_mut(&mut self) -> Option<&mut Progress> {
        match self {
            Self::Running(p) | Self::Paused(p) => Some(p),
            Self::Idle | Self::Completed { .. } => None,
        }
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        let status = self.status();
        let Some(progress) = self.progress() else {
            return SessionSnapshot::idle();
        };
        let clock = progress.clock();
        SessionSnapshot {
            status,
            session_id: Some(progress.session_id),
            definition: Some(Arc::clone(&progress.definition)),
            elapsed: progress.elapsed,
            phase_index: progress.phase_index,
            progress_fraction: clock.progress_fraction,
            remaining: clock.remaining,
            started_at: Some(progress.started_at),
        }
    }
}

/// Read-only view of the session for display collaborators.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Current status
    pub status: SessionStatus,
    /// Id of the active session
    pub session_id: Option<Uuid>,
    /// Transition being run
    pub definition: Option<Arc<TransitionDefinition>>,
    /// Elapsed ticks
    pub elapsed: u64,
    /// Active phase index
    pub phase_index: usize,
    /// Overall progress in `[0, 1]`
    pub progress_fraction: f64,
    /// Ticks left
    pub remaining: u64,
    /// When the session started (or was restored)
    pub started_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    const fn idle() -> Self {
        Self {
            status: SessionStatus::Idle,
            session_id: None,
            definition: None,
            elapsed: 0,
            phase_index: 0,
            progress_fraction: 0.0,
            remaining: 0,
            started_at: None,
        }
    }

    /// Whether ticks are being delivered.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.status == SessionStatus::Running
    }

    /// Whether the session reached its end.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// Name of the active phase, if a session exists.
    #[must_use]
    pub fn phase_name(&self) -> Option<&str> {
        self.definition
            .as_ref()
            .and_then(|d| d.phase(self.phase_index))
            .map(|p| p.name.as_str())
    }
}

/// Why a session was torn down without completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Explicit stop
    Stopped,
    /// Explicit abandon, nothing persisted
    Abandoned,
    /// Stopped after saving progress
    Saved,
}

/// Notification emitted after each state mutation.
///
/// Tagged with `"type"` when serialized so event-log consumers can dispatch
/// on the kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A session started or was restored.
    SessionStarted {
        /// Session id
        session_id: Uuid,
        /// Transition id
        transition_id: String,
    },
    /// The active phase changed.
    PhaseChanged {
        /// New phase index
        index: usize,
        /// New phase name
        name: String,
    },
    /// Elapsed time changed.
    ProgressChanged {
        /// Elapsed ticks
        elapsed: u64,
        /// Overall progress in `[0, 1]`
        fraction: f64,
    },
    /// Ticking was suspended.
    Paused {
        /// Elapsed ticks at pause
        elapsed: u64,
    },
    /// Ticking resumed.
    Resumed {
        /// Elapsed ticks at resume
        elapsed: u64,
    },
    /// The session reached its total duration.
    SessionCompleted {
        /// Transition id
        transition_id: String,
    },
    /// The session was torn down before completion, or after completion
    /// without an evaluation.
    SessionStopped {
        /// Why
        reason: StopReason,
    },
    /// A save was attempted.
    ProgressSaved {
        /// Whether the store accepted the record
        persisted: bool,
    },
    /// An evaluation was submitted.
    EvaluationSubmitted {
        /// Submitted rating
        effectiveness: u8,
    },
    /// The evaluation was put off.
    EvaluationDeferred,
}
