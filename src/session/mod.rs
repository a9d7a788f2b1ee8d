//! Session engine
//!
//! The [`SessionController`] state machine, the notifications it emits, and
//! post-session evaluation capture.

pub mod controller;
pub mod evaluation;
pub mod state;

pub use controller::{SaveOutcome, SessionController, SessionControllerBuilder};
pub use evaluation::{EvaluationDraft, EvaluationRecord};
pub use state::{SessionEvent, SessionSnapshot, SessionStatus, StopReason};
