//! Saved-progress records and the stores that hold them.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PersistenceError;

/// Snapshot of an interrupted session, written on explicit save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedProgress {
    /// Id of the transition that was running
    pub transition_id: String,
    /// Phase index at save time
    #[serde(rename = "currentPhase")]
    pub phase_index: usize,
    /// Elapsed ticks at save time
    #[serde(rename = "elapsedTime")]
    pub elapsed: u64,
    /// Source emotion id
    #[serde(rename = "fromEmotion")]
    pub from: String,
    /// Target emotion id
    #[serde(rename = "targetEmotion")]
    pub to: String,
    /// When the record was created
    #[serde(rename = "timestamp")]
    pub saved_at: DateTime<Utc>,
}

/// Storage port for saved progress.
///
/// Holds at most one record; a new save replaces the previous one. Expiry
/// is the implementation's business.
pub trait ProgressStore: Send + Sync {
    /// Persists `record`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be written.
    fn save(&self, record: &SavedProgress) -> Result<(), PersistenceError>;

    /// Returns the stored record, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store exists but cannot be read.
    fn load(&self) -> Result<Option<SavedProgress>, PersistenceError>;

    /// Removes the stored record. Removing from an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be removed.
    fn clear(&self) -> Result<(), PersistenceError>;
}

/// In-process store, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Option<SavedProgress>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<SavedProgress>>, PersistenceError> {
        self.record
            .lock()
            .map_err(|_| PersistenceError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl ProgressStore for MemoryStore {
    fn save(&self, record: &SavedProgress) -> Result<(), PersistenceError> {
        *self.slot()? = Some(record.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<SavedProgress>, PersistenceError> {
        Ok(self.slot()?.clone())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        *self.slot()? = None;
        Ok(())
    }
}

/// Store backed by a single JSON file.
///
/// Writes go to a sibling temporary file that is renamed over the target,
/// so a crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store at `path`. Nothing is touched until the first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ProgressStore for JsonFileStore {
    fn save(&self, record: &SavedProgress) -> Result<(), PersistenceError> {
        if self.path.as_os_str().is_empty() {
            return Err(PersistenceError::Unavailable(
                "progress store path is empty".to_string(),
            ));
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(record)?;
        let temp = self.temp_path();
        let mut file = fs::File::create(&temp)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp, &self.path)?;

        debug!(path = %self.path.display(), "progress saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<SavedProgress>, PersistenceError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
