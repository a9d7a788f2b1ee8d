//! Session controller
//!
//! [`SessionController`] owns the session state machine and the tick source
//! that drives it:
//!
//! ```text
//! Idle ──start──▶ Running ◀──resume── Paused
//!                  │   └────pause────────▲
//!                  │ (total reached)
//!                  ▼
//!              Completed ──submit/defer/stop──▶ Idle
//! ```
//!
//! Running and Paused sessions return to Idle through stop, abandon, or
//! save. All operations are synchronous; the only asynchronous piece is the
//! tick source, a tokio task holding a [`Weak`] reference back to the
//! controller. Every tick source carries a generation number and a tick is
//! applied only if its generation is current, so no tick mutates state after
//! the operation that cancelled it has returned.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, TransitionDefinition};
use crate::config::SessionSettings;
use crate::error::{CatalogError, PersistenceError, SessionError};
use crate::observability::EventLog;
use crate::observability::metrics;
use crate::phase::jump_offset;
use crate::store::{CompletedTransition, JournalSink, MemoryJournal, MemoryStore, ProgressStore, SavedProgress};

use super::evaluation::{EvaluationDraft, EvaluationRecord};
use super::state::{Progress, SessionEvent, SessionSnapshot, SessionState, SessionStatus, StopReason};

// ============================================================================
// Save Outcome
// ============================================================================

/// Result of [`SessionController::save_progress`].
///
/// The session is reset either way; a failed write only means the record
/// did not reach the store.
#[derive(Debug)]
pub enum SaveOutcome {
    /// The store accepted the record.
    Persisted(SavedProgress),
    /// The store rejected the record.
    NotPersisted {
        /// The record that was built
        record: SavedProgress,
        /// Why the store rejected it
        error: PersistenceError,
    },
}

impl SaveOutcome {
    /// Whether the record reached the store.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted(_))
    }

    /// The record that was built, persisted or not.
    #[must_use]
    pub const fn record(&self) -> &SavedProgress {
        match self {
            Self::Persisted(record) | Self::NotPersisted { record, .. } => record,
        }
    }
}

// ============================================================================
// Tick Source
// ============================================================================

/// Handle to a running tick task. Dropping it stops the task.
struct TickSource {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Drop for TickSource {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

// ============================================================================
// Controller
// ============================================================================

struct Inner {
    state: SessionState,
    generation: u64,
    ticker: Option<TickSource>,
    subscribers: Vec<mpsc::UnboundedSender<SessionEvent>>,
}

/// Drives one session at a time through its phases.
///
/// Created behind an [`Arc`] by [`SessionControllerBuilder::build`]. The tick
/// source is released on every exit path, including when the controller is
/// dropped.
pub struct SessionController {
    // std::sync::Mutex is intentional: never held across .await points.
    inner: Mutex<Inner>,
    store: Arc<dyn ProgressStore>,
    journal: Arc<dyn JournalSink>,
    tick_interval: Duration,
    event_log: Option<Arc<EventLog>>,
    this: Weak<Self>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("status", &self.status())
            .field("tick_interval", &self.tick_interval)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Returns a builder with in-memory stores and default settings.
    #[must_use]
    pub fn builder() -> SessionControllerBuilder {
        SessionControllerBuilder::default()
    }

    /// Creates a controller with in-memory stores and default settings.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::builder().build()
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Starts a session for `definition` at elapsed 0, phase 0.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidStateTransition`] unless the controller
    /// is idle, or [`SessionError::NoRuntime`] when called outside a tokio
    /// runtime.
    pub fn start(&self, definition: Arc<TransitionDefinition>) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if !matches!(inner.state, SessionState::Idle) {
            return Err(invalid("start", &inner.state));
        }
        let runtime = runtime()?;
        self.acquire_tick_source(&mut inner, &runtime);

        let progress = Progress::new(definition);
        let event = SessionEvent::SessionStarted {
            session_id: progress.session_id,
            transition_id: progress.definition.id().to_string(),
        };
        info!(
            transition = progress.definition.id(),
            session_id = %progress.session_id,
            total = progress.definition.total_duration(),
            "session started"
        );
        metrics::record_session_started(progress.definition.id());
        metrics::set_elapsed(0);
        inner.state = SessionState::Running(progress);

        self.publish(inner, vec![event]);
        Ok(())
    }

    /// Suspends ticking. Elapsed time is kept.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidStateTransition`] unless running;
    /// pausing twice is an error.
    pub fn pause(&self) -> Result<(), SessionError> {
        let mut inner = self.lock();
        let SessionState::Running(progress) = &inner.state else {
            return Err(invalid("pause", &inner.state));
        };
        let elapsed = progress.elapsed;

        release_tick_source(&mut inner);
        transform(&mut inner, |state| match state {
            SessionState::Running(p) => SessionState::Paused(p),
            other => other,
        });
        info!(elapsed, "session paused");

        self.publish(inner, vec![SessionEvent::Paused { elapsed }]);
        Ok(())
    }

    /// Continues ticking from where the session paused.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidStateTransition`] unless paused, or
    /// [`SessionError::NoRuntime`] when called outside a tokio runtime.
    pub fn resume(&self) -> Result<(), SessionError> {
        let mut inner = self.lock();
        let SessionState::Paused(progress) = &inner.state else {
            return Err(invalid("resume", &inner.state));
        };
        let elapsed = progress.elapsed;
        let runtime = runtime()?;

        self.acquire_tick_source(&mut inner, &runtime);
        transform(&mut inner, |state| match state {
            SessionState::Paused(p) => SessionState::Running(p),
            other => other,
        });
        info!(elapsed, "session resumed");

        self.publish(inner, vec![SessionEvent::Resumed { elapsed }]);
        Ok(())
    }

    /// Moves to phase `index`, one tick past its start.
    ///
    /// `index` is clamped to the phase list. Jumping to the current phase
    /// changes nothing. A running session gets a fresh tick source, so the
    /// next tick arrives one full interval after the jump.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidStateTransition`] unless running or
    /// paused, or [`SessionError::NoRuntime`] when a running session is
    /// jumped from outside a tokio runtime.
    pub fn jump_to_phase(&self, index: usize) -> Result<(), SessionError> {
        self.jump_with("jump to a phase", |_| index)
    }

    /// Jumps to the phase after the current one; no-op on the last phase.
    ///
    /// # Errors
    ///
    /// Same as [`jump_to_phase`](Self::jump_to_phase).
    pub fn next_phase(&self) -> Result<(), SessionError> {
        self.jump_with("skip to the next phase", |current| current.saturating_add(1))
    }

    /// Jumps to the phase before the current one; no-op on the first phase.
    ///
    /// # Errors
    ///
    /// Same as [`jump_to_phase`](Self::jump_to_phase).
    pub fn previous_phase(&self) -> Result<(), SessionError> {
        self.jump_with("go back a phase", |current| current.saturating_sub(1))
    }

    /// Ends the session and discards its progress and any evaluation draft.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidStateTransition`] when idle.
    pub fn stop(&self) -> Result<(), SessionError> {
        self.teardown("stop", StopReason::Stopped)
    }

    /// Same as [`stop`](Self::stop), explicitly persisting nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidStateTransition`] when idle.
    pub fn abandon(&self) -> Result<(), SessionError> {
        self.teardown("abandon", StopReason::Abandoned)
    }

    /// Hands the session position to the progress store and resets to idle.
    ///
    /// The reset happens even when the store fails; the failure is logged
    /// and reported through [`SaveOutcome::NotPersisted`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidStateTransition`] unless running or
    /// paused.
    pub fn save_progress(&self) -> Result<SaveOutcome, SessionError> {
        let mut inner = self.lock();
        let Some(progress) = inner.state.active() else {
            return Err(invalid("save progress", &inner.state));
        };
        let record = SavedProgress {
            transition_id: progress.definition.id().to_string(),
            phase_index: progress.phase_index,
            elapsed: progress.elapsed,
            from: progress.definition.from().to_string(),
            to: progress.definition.to().to_string(),
            saved_at: Utc::now(),
        };

        release_tick_source(&mut inner);
        inner.state = SessionState::Idle;

        let outcome = match self.store.save(&record) {
            Ok(()) => {
                info!(
                    transition = %record.transition_id,
                    elapsed = record.elapsed,
                    "progress saved"
                );
                SaveOutcome::Persisted(record)
            }
            Err(error) => {
                warn!(%error, transition = %record.transition_id, "progress could not be saved");
                SaveOutcome::NotPersisted { record, error }
            }
        };
        let persisted = outcome.is_persisted();
        metrics::record_progress_saved(persisted);
        metrics::record_session_stopped(StopReason::Saved);

        self.publish(
            inner,
            vec![
                SessionEvent::ProgressSaved { persisted },
                SessionEvent::SessionStopped {
                    reason: StopReason::Saved,
                },
            ],
        );
        Ok(outcome)
    }

    /// Rebuilds a paused session from a saved record.
    ///
    /// Elapsed time is clamped to the definition's total and the phase is
    /// recomputed from it. A record at or past the total restores straight
    /// into the completed state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidStateTransition`] unless idle, or
    /// [`CatalogError::InvalidDefinition`] if the record belongs to another
    /// transition.
    pub fn restore(
        &self,
        definition: Arc<TransitionDefinition>,
        record: &SavedProgress,
    ) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if !matches!(inner.state, SessionState::Idle) {
            return Err(invalid("restore", &inner.state));
        }
        if record.transition_id != definition.id() {
            return Err(CatalogError::InvalidDefinition {
                id: definition.id().to_string(),
                reason: format!(
                    "saved progress belongs to transition '{}'",
                    record.transition_id
                ),
            }
            .into());
        }

        let mut progress = Progress::new(definition);
        let (clock, _) = progress.set_elapsed(record.elapsed);
        if progress.phase_index != record.phase_index {
            warn!(
                saved = record.phase_index,
                computed = progress.phase_index,
                "saved phase disagrees with elapsed time, using computed phase"
            );
        }

        let mut events = vec![
            SessionEvent::SessionStarted {
                session_id: progress.session_id,
                transition_id: progress.definition.id().to_string(),
            },
            SessionEvent::ProgressChanged {
                elapsed: progress.elapsed,
                fraction: clock.progress_fraction,
            },
        ];
        info!(
            transition = progress.definition.id(),
            elapsed = progress.elapsed,
            phase = progress.phase_index,
            "session restored"
        );
        metrics::record_session_started(progress.definition.id());
        metrics::set_elapsed(progress.elapsed);

        if clock.is_complete {
            let transition_id = progress.definition.id().to_string();
            inner.state = SessionState::Completed {
                progress,
                evaluation: EvaluationDraft::new(),
            };
            events.push(SessionEvent::SessionCompleted { transition_id });
        } else {
            events.push(SessionEvent::Paused {
                elapsed: progress.elapsed,
            });
            inner.state = SessionState::Paused(progress);
        }

        self.publish(inner, events);
        Ok(())
    }

    /// Restores the record held by the progress store, if any.
    ///
    /// The definition is resolved through `catalog` and the store entry is
    /// cleared once the session is rebuilt. Returns `false` when the store is
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read, the transition cannot
    /// be resolved, or the controller is not idle.
    pub fn restore_saved(&self, catalog: &Catalog) -> Result<bool, SessionError> {
        let Some(record) = self.store.load()? else {
            debug!("no saved progress");
            return Ok(false);
        };
        let definition =
            catalog.resolve_by_id(&record.transition_id, &record.from, &record.to)?;
        self.restore(definition, &record)?;

        if let Err(error) = self.store.clear() {
            warn!(%error, "saved progress could not be cleared");
        }
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------------

    /// Records the emotion the user reports feeling after the session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidStateTransition`] unless completed.
    pub fn record_current_emotion(&self, emotion_id: &str) -> Result<(), SessionError> {
        self.with_draft("record an evaluation", |draft| {
            draft.record_current_emotion(emotion_id);
        })
    }

    /// Records the effectiveness rating (1 to 5).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidStateTransition`] unless completed, or
    /// an evaluation error for an out-of-range rating.
    pub fn record_effectiveness(&self, rating: u8) -> Result<(), SessionError> {
        self.with_draft("record an evaluation", |draft| {
            draft.record_effectiveness(rating)
        })?
        .map_err(SessionError::from)
    }

    /// Records optional free-text feedback.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidStateTransition`] unless completed.
    pub fn record_feedback(&self, text: &str) -> Result<(), SessionError> {
        self.with_draft("record an evaluation", |draft| draft.record_feedback(text))
    }

    /// Returns a copy of the evaluation being filled in, if completed.
    #[must_use]
    pub fn evaluation_draft(&self) -> Option<EvaluationDraft> {
        match &self.lock().state {
            SessionState::Completed { evaluation, .. } => Some(evaluation.clone()),
            _ => None,
        }
    }

    /// Validates the evaluation, hands it to the journal, and resets to idle.
    ///
    /// A journal failure is logged; the submission still succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidStateTransition`] unless completed, or
    /// an incomplete-evaluation error naming the missing fields, in which
    /// case the session stays completed with its draft intact.
    pub fn submit_evaluation(&self) -> Result<EvaluationRecord, SessionError> {
        let mut inner = self.lock();
        let (record, entry) = match &mut inner.state {
            SessionState::Completed {
                progress,
                evaluation,
            } => {
                let record = evaluation.submit()?;
                let entry = CompletedTransition {
                    transition_id: progress.definition.id().to_string(),
                    from: progress.definition.from().to_string(),
                    to: progress.definition.to().to_string(),
                    evaluation: record.clone(),
                    completed_at: Utc::now(),
                };
                (record, entry)
            }
            other => return Err(invalid("submit an evaluation", other)),
        };

        if let Err(error) = self.journal.record(&entry) {
            warn!(%error, transition = %entry.transition_id, "evaluation could not be journaled");
        }
        inner.state = SessionState::Idle;
        info!(
            transition = %entry.transition_id,
            effectiveness = record.effectiveness,
            "evaluation submitted"
        );
        metrics::record_evaluation_submitted(record.effectiveness);

        self.publish(
            inner,
            vec![SessionEvent::EvaluationSubmitted {
                effectiveness: record.effectiveness,
            }],
        );
        Ok(record)
    }

    /// Discards the evaluation draft and resets to idle without journaling.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidStateTransition`] unless completed.
    pub fn defer_evaluation(&self) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if !matches!(inner.state, SessionState::Completed { .. }) {
            return Err(invalid("defer an evaluation", &inner.state));
        }
        inner.state = SessionState::Idle;
        info!("evaluation deferred");
        metrics::record_evaluation_deferred();

        self.publish(inner, vec![SessionEvent::EvaluationDeferred]);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------------

    /// Returns a read-only view of the session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().state.snapshot()
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.lock().state.status()
    }

    /// Registers a new notification receiver.
    ///
    /// Events are delivered in the order the mutations happened. Dropping the
    /// receiver unsubscribes it.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delivers `events` to subscribers in order, then releases the lock
    /// before the event log touches its writer.
    fn publish(&self, mut inner: MutexGuard<'_, Inner>, events: Vec<SessionEvent>) {
        for event in &events {
            inner
                .subscribers
                .retain(|tx| tx.send(event.clone()).is_ok());
        }
        let stamped = self.event_log.as_ref().map(|log| log.stamp(events));
        drop(inner);

        if let (Some(log), Some(stamped)) = (&self.event_log, stamped) {
            log.write(&stamped);
        }
    }

    /// Spawns a fresh tick source, tearing down the previous one first.
    fn acquire_tick_source(&self, inner: &mut Inner, runtime: &Handle) {
        release_tick_source(inner);
        let generation = inner.generation;
        let period = self.tick_interval;
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let controller = Weak::clone(&self.this);

        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        debug!(generation, "tick source cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        let Some(controller) = controller.upgrade() else {
                            break;
                        };
                        if !controller.on_tick(generation) {
                            break;
                        }
                    }
                }
            }
        });

        debug!(generation, ?period, "tick source acquired");
        inner.ticker = Some(TickSource { cancel, handle });
    }

    /// Applies one tick. Returns `false` once the tick source should stop.
    fn on_tick(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(generation, current = inner.generation, "stale tick ignored");
            return false;
        }
        let SessionState::Running(progress) = &mut inner.state else {
            return false;
        };

        let (clock, changed) = progress.set_elapsed(progress.elapsed + 1);
        let mut events = Vec::with_capacity(3);
        if changed {
            events.push(phase_changed(progress));
        }
        events.push(SessionEvent::ProgressChanged {
            elapsed: progress.elapsed,
            fraction: clock.progress_fraction,
        });
        debug!(elapsed = progress.elapsed, phase = progress.phase_index, "tick");
        metrics::set_elapsed(progress.elapsed);

        if clock.is_complete {
            events.extend(complete(&mut inner));
        }
        self.publish(inner, events);
        !clock.is_complete
    }

    fn jump_with(
        &self,
        operation: &'static str,
        target: impl FnOnce(usize) -> usize,
    ) -> Result<(), SessionError> {
        let mut inner = self.lock();
        let runtime = match &inner.state {
            SessionState::Running(_) => Some(runtime()?),
            SessionState::Paused(_) => None,
            other => return Err(invalid(operation, other)),
        };

        let Some(progress) = inner.state.active_mut() else {
            return Ok(());
        };
        let index = target(progress.phase_index).min(progress.definition.last_phase_index());
        if index == progress.phase_index {
            return Ok(());
        }

        let offset = jump_offset(progress.definition.phases(), index);
        let (clock, _) = progress.set_elapsed(offset);
        let mut events = vec![
            phase_changed(progress),
            SessionEvent::ProgressChanged {
                elapsed: progress.elapsed,
                fraction: clock.progress_fraction,
            },
        ];
        info!(
            requested = index,
            phase = progress.phase_index,
            elapsed = progress.elapsed,
            "jumped to phase"
        );
        metrics::set_elapsed(progress.elapsed);

        if clock.is_complete {
            events.extend(complete(&mut inner));
        } else if let Some(runtime) = runtime {
            self.acquire_tick_source(&mut inner, &runtime);
        }
        self.publish(inner, events);
        Ok(())
    }

    fn teardown(&self, operation: &'static str, reason: StopReason) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if matches!(inner.state, SessionState::Idle) {
            return Err(invalid(operation, &inner.state));
        }
        release_tick_source(&mut inner);
        inner.state = SessionState::Idle;
        info!(?reason, "session stopped");
        metrics::record_session_stopped(reason);

        self.publish(inner, vec![SessionEvent::SessionStopped { reason }]);
        Ok(())
    }

    fn with_draft<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut EvaluationDraft) -> T,
    ) -> Result<T, SessionError> {
        match &mut self.lock().state {
            SessionState::Completed { evaluation, .. } => Ok(f(evaluation)),
            other => Err(invalid(operation, other)),
        }
    }
}

/// Stops the current tick source and invalidates any tick already in flight.
fn release_tick_source(inner: &mut Inner) {
    if inner.ticker.take().is_some() {
        debug!(generation = inner.generation, "tick source released");
    }
    inner.generation = inner.generation.wrapping_add(1);
}

/// Moves a running or paused session into the completed state.
fn complete(inner: &mut Inner) -> Option<SessionEvent> {
    release_tick_source(inner);
    let mut event = None;
    transform(inner, |state| match state {
        SessionState::Running(progress) | SessionState::Paused(progress) => {
            let transition_id = progress.definition.id().to_string();
            info!(transition = %transition_id, "session completed");
            metrics::record_session_completed(&transition_id);
            event = Some(SessionEvent::SessionCompleted { transition_id });
            SessionState::Completed {
                progress,
                evaluation: EvaluationDraft::new(),
            }
        }
        other => other,
    });
    event
}

fn transform(inner: &mut Inner, f: impl FnOnce(SessionState) -> SessionState) {
    let state = std::mem::take(&mut inner.state);
    inner.state = f(state);
}

fn phase_changed(progress: &Progress) -> SessionEvent {
    let name = progress
        .definition
        .phase(progress.phase_index)
        .map(|p| p.name.clone())
        .unwrap_or_default();
    metrics::record_phase_change(&name);
    SessionEvent::PhaseChanged {
        index: progress.phase_index,
        name,
    }
}

fn runtime() -> Result<Handle, SessionError> {
    Handle::try_current().map_err(|_| SessionError::NoRuntime)
}

const fn invalid(operation: &'static str, state: &SessionState) -> SessionError {
    SessionError::InvalidStateTransition {
        operation,
        state: state.status().as_str(),
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`SessionController`].
pub struct SessionControllerBuilder {
    store: Arc<dyn ProgressStore>,
    journal: Arc<dyn JournalSink>,
    tick_interval: Duration,
    event_log: Option<Arc<EventLog>>,
}

impl Default for SessionControllerBuilder {
    fn default() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            journal: Arc::new(MemoryJournal::new()),
            tick_interval: SessionSettings::default().tick_interval,
            event_log: None,
        }
    }
}

impl SessionControllerBuilder {
    /// Sets the progress store.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn ProgressStore>) -> Self {
        self.store = store;
        self
    }

    /// Sets the evaluation journal.
    #[must_use]
    pub fn journal(mut self, journal: Arc<dyn JournalSink>) -> Self {
        self.journal = journal;
        self
    }

    /// Sets the wall-clock length of one tick. Zero is ignored.
    #[must_use]
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.tick_interval = interval;
        }
        self
    }

    /// Applies the tick interval from `settings`.
    #[must_use]
    pub fn settings(self, settings: &SessionSettings) -> Self {
        self.tick_interval(settings.tick_interval)
    }

    /// Mirrors every event to `log`.
    #[must_use]
    pub fn event_log(mut self, log: Arc<EventLog>) -> Self {
        self.event_log = Some(log);
        self
    }

    /// Builds the controller.
    #[must_use]
    pub fn build(self) -> Arc<SessionController> {
        Arc::new_cyclic(|this| SessionController {
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                generation: 0,
                ticker: None,
                subscribers: Vec::new(),
            }),
            store: self.store,
            journal: self.journal,
            tick_interval: self.tick_interval,
            event_log: self.event_log,
            this: Weak::clone(this),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::OnceLock;

    use super::*;
    use crate::catalog::Phase;

    fn definition() -> Arc<TransitionDefinition> {
        Arc::new(
            TransitionDefinition::new(
                "a-to-b",
                "A to B",
                "",
                "a",
                "b",
                vec![Phase::new("one", 3), Phase::new("two", 4)],
            )
            .unwrap(),
        )
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_start_outside_runtime_fails_and_stays_idle() {
        let controller = SessionController::new();
        let err = controller.start(definition()).unwrap_err();
        assert!(matches!(err, SessionError::NoRuntime));
        assert_eq!(controller.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_operations_on_idle_are_rejected() {
        let controller = SessionController::new();
        for result in [
            controller.pause(),
            controller.resume(),
            controller.stop(),
            controller.abandon(),
            controller.jump_to_phase(1),
            controller.defer_evaluation(),
        ] {
            assert!(matches!(
                result,
                Err(SessionError::InvalidStateTransition { state: "idle", .. })
            ));
        }
        assert!(controller.save_progress().is_err());
        assert!(controller.submit_evaluation().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_generation_is_ignored() {
        let controller = SessionController::new();
        controller.start(definition()).unwrap();
        let current = controller.lock().generation;

        assert!(!controller.on_tick(current.wrapping_sub(1)));
        assert_eq!(controller.snapshot().elapsed, 0);

        assert!(controller.on_tick(current));
        assert_eq!(controller.snapshot().elapsed, 1);
        controller.stop().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_after_pause_does_nothing() {
        let controller = SessionController::new();
        controller.start(definition()).unwrap();
        let generation = controller.lock().generation;
        controller.pause().unwrap();

        assert!(!controller.on_tick(generation));
        assert_eq!(controller.snapshot().elapsed, 0);
        assert!(controller.lock().ticker.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_through_completion() {
        let controller = SessionController::new();
        let mut rx = controller.subscribe();
        controller.start(definition()).unwrap();
        let generation = controller.lock().generation;

        for _ in 0..6 {
            assert!(controller.on_tick(generation));
        }
        assert!(!controller.on_tick(generation));

        let snapshot = controller.snapshot();
        assert!(snapshot.is_complete());
        assert_eq!(snapshot.elapsed, 7);
        assert_eq!(snapshot.phase_index, 1);
        assert!(controller.lock().ticker.is_none());

        let events = drain(&mut rx);
        let phase_changes = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::PhaseChanged { .. }))
            .count();
        assert_eq!(phase_changes, 1);
        assert!(matches!(
            events.last(),
            Some(SessionEvent::SessionCompleted { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_jump_restarts_tick_source() {
        let controller = SessionController::new();
        controller.start(definition()).unwrap();
        let before = controller.lock().generation;

        controller.jump_to_phase(1).unwrap();
        let after = controller.lock().generation;
        assert_ne!(before, after);
        assert!(controller.lock().ticker.is_some());
        assert_eq!(controller.snapshot().elapsed, 4);

        // A tick from the old source is rejected
        assert!(!controller.on_tick(before));
        assert_eq!(controller.snapshot().elapsed, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_jump_same_phase_is_noop() {
        let controller = SessionController::new();
        let mut rx = controller.subscribe();
        controller.start(definition()).unwrap();
        let generation = controller.lock().generation;
        drain(&mut rx);

        controller.jump_to_phase(0).unwrap();
        assert_eq!(controller.lock().generation, generation);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_from_completed_drops_draft() {
        let controller = SessionController::new();
        controller.start(definition()).unwrap();
        controller.jump_to_phase(1).unwrap();
        let generation = controller.lock().generation;
        while controller.on_tick(generation) {}
        controller.record_effectiveness(3).unwrap();

        controller.stop().unwrap();
        assert_eq!(controller.status(), SessionStatus::Idle);
        assert!(controller.evaluation_draft().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_subscribers_are_pruned() {
        let controller = SessionController::new();
        let rx = controller.subscribe();
        drop(rx);
        let mut live = controller.subscribe();
        controller.start(definition()).unwrap();

        assert_eq!(controller.lock().subscribers.len(), 1);
        assert!(matches!(
            live.try_recv(),
            Ok(SessionEvent::SessionStarted { .. })
        ));
        controller.abandon().unwrap();
    }

    /// Records, on every write, whether the controller lock was free.
    struct LockCheckingWriter {
        controller: Arc<OnceLock<Weak<SessionController>>>,
        lock_free: Arc<Mutex<Vec<bool>>>,
    }

    impl Write for LockCheckingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if let Some(controller) = self.controller.get().and_then(Weak::upgrade) {
                let free = controller.inner.try_lock().is_ok();
                self.lock_free.lock().unwrap().push(free);
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_log_written_outside_controller_lock() {
        let slot = Arc::new(OnceLock::new());
        let lock_free = Arc::new(Mutex::new(Vec::new()));
        let writer = LockCheckingWriter {
            controller: Arc::clone(&slot),
            lock_free: Arc::clone(&lock_free),
        };
        let log = Arc::new(EventLog::new(Box::new(writer)));
        let controller = SessionController::builder()
            .event_log(Arc::clone(&log))
            .build();
        slot.set(Arc::downgrade(&controller)).unwrap();
        let mut rx = controller.subscribe();

        controller.start(definition()).unwrap();
        let generation = controller.lock().generation;
        assert!(controller.on_tick(generation));
        controller.next_phase().unwrap();
        controller.pause().unwrap();
        controller.stop().unwrap();

        let lock_free = lock_free.lock().unwrap();
        assert!(!lock_free.is_empty());
        assert!(lock_free.iter().all(|&free| free));
        assert_eq!(log.event_count(), drain(&mut rx).len() as u64);
    }

    #[test]
    fn test_save_outcome_accessors() {
        let record = SavedProgress {
            transition_id: "a-to-b".to_string(),
            phase_index: 0,
            elapsed: 1,
            from: "a".to_string(),
            to: "b".to_string(),
            saved_at: Utc::now(),
        };
        let outcome = SaveOutcome::NotPersisted {
            record: record.clone(),
            error: PersistenceError::Unavailable("full".to_string()),
        };
        assert!(!outcome.is_persisted());
        assert_eq!(outcome.record(), &record);
        assert!(SaveOutcome::Persisted(record).is_persisted());
    }
}
