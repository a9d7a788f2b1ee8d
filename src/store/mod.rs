//! Persistence ports
//!
//! The session engine depends only on the [`ProgressStore`] and
//! [`JournalSink`] traits; the storage medium is chosen by the caller.

pub mod journal;
pub mod progress;

pub use journal::{CompletedTransition, JournalSink, JsonlJournal, MemoryJournal};
pub use progress::{JsonFileStore, MemoryStore, ProgressStore, SavedProgress};
