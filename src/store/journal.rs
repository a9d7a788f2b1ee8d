//! Emotional journal sinks for submitted evaluations.
//!
//! Each submitted evaluation becomes one [`CompletedTransition`] entry.
//! [`JsonlJournal`] appends entries as NDJSON lines to a file.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PersistenceError;
use crate::session::evaluation::EvaluationRecord;

/// Journal entry for one completed and evaluated transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTransition {
    /// Id of the transition that ran
    pub transition_id: String,
    /// Source emotion id
    pub from: String,
    /// Target emotion id
    pub to: String,
    /// What the user reported afterwards
    pub evaluation: EvaluationRecord,
    /// When the evaluation was submitted
    pub completed_at: DateTime<Utc>,
}

/// Consumer of submitted evaluations.
pub trait JournalSink: Send + Sync {
    /// Records one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be stored.
    fn record(&self, entry: &CompletedTransition) -> Result<(), PersistenceError>;
}

/// In-process journal.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<CompletedTransition>>,
}

impl MemoryJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<CompletedTransition> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl JournalSink for MemoryJournal {
    fn record(&self, entry: &CompletedTransition) -> Result<(), PersistenceError> {
        self.entries
            .lock()
            .map_err(|_| PersistenceError::Unavailable("journal lock poisoned".to_string()))?
            .push(entry.clone());
        Ok(())
    }
}

/// Append-only NDJSON journal file.
pub struct JsonlJournal {
    // std::sync::Mutex is intentional: held briefly for buffered write + flush,
    // never across .await points.
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl std::fmt::Debug for JsonlJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlJournal")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl JsonlJournal {
    /// Opens (or creates) the journal file at `path` for appending.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        if path.as_os_str().is_empty() {
            return Err(PersistenceError::Unavailable(
                "journal path is empty".to_string(),
            ));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!(path = %path.display(), "journal opened");

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Returns the journal file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every entry from a journal file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a line is not a valid
    /// entry.
    pub fn read_all(path: &Path) -> Result<Vec<CompletedTransition>, PersistenceError> {
        let raw = fs::read_to_string(path)?;
        raw.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(PersistenceError::from))
            .collect()
    }
}

impl JournalSink for JsonlJournal {
    fn record(&self, entry: &CompletedTransition) -> Result<(), PersistenceError> {
        let line = serde_json::to_string(entry)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| PersistenceError::Unavailable("journal lock poisoned".to_string()))?;
        writeln!(writer, "{line}")?;
        writer.flush()?;
        drop(writer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rating: u8) -> CompletedTransition {
        CompletedTransition {
            transition_id: "anxiety-to-calm".to_string(),
            from: "anxiety".to_string(),
            to: "calm".to_string(),
            evaluation: EvaluationRecord {
                current_emotion: "calm".to_string(),
                effectiveness: rating,
                feedback: None,
            },
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn test_memory_journal_keeps_order() {
        let journal = MemoryJournal::new();
        journal.record(&entry(2)).unwrap();
        journal.record(&entry(5)).unwrap();
        let ratings: Vec<u8> = journal
            .entries()
            .iter()
            .map(|e| e.evaluation.effectiveness)
            .collect();
        assert_eq!(ratings, vec![2, 5]);
    }

    #[test]
    fn test_jsonl_journal_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");

        {
            let journal = JsonlJournal::open(&path).unwrap();
            journal.record(&entry(3)).unwrap();
        }
        {
            let journal = JsonlJournal::open(&path).unwrap();
            journal.record(&entry(4)).unwrap();
        }

        let entries = JsonlJournal::read_all(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].evaluation.effectiveness, 3);
        assert_eq!(entries[1].evaluation.effectiveness, 4);
    }

    #[test]
    fn test_jsonl_journal_empty_path() {
        assert!(matches!(
            JsonlJournal::open(Path::new("")),
            Err(PersistenceError::Unavailable(_))
        ));
    }
}
