//! Shared integration-test helpers: canned definitions, event draining, a
//! failing store, and a runner for the `moodharmony` binary.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::Arc;

use moodharmony::catalog::{Phase, TransitionDefinition};
use moodharmony::error::PersistenceError;
use moodharmony::session::SessionEvent;
use moodharmony::store::{ProgressStore, SavedProgress};
use tokio::sync::mpsc::UnboundedReceiver;

/// The built-in anxiety → calm transition: phases of 5, 10, 10 and 5 ticks.
pub fn anxiety_to_calm() -> Arc<TransitionDefinition> {
    Arc::new(
        TransitionDefinition::new(
            "anxiety-to-calm",
            "From anxiety to calm",
            "",
            "anxiety",
            "calm",
            vec![
                Phase::new("Recognition", 5),
                Phase::new("Stabilisation", 10),
                Phase::new("Transition", 10),
                Phase::new("Integration", 5),
            ],
        )
        .unwrap(),
    )
}

/// A two-phase transition that completes after `first + second` ticks.
pub fn short_transition(first: u64, second: u64) -> Arc<TransitionDefinition> {
    Arc::new(
        TransitionDefinition::new(
            "short",
            "Short",
            "",
            "anxiety",
            "calm",
            vec![Phase::new("First", first), Phase::new("Second", second)],
        )
        .unwrap(),
    )
}

/// Returns every event currently queued on `rx`.
pub fn drain(rx: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Store whose writes always fail.
#[derive(Debug, Default)]
pub struct FailingStore;

impl ProgressStore for FailingStore {
    fn save(&self, _record: &SavedProgress) -> Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable("disk full".to_string()))
    }

    fn load(&self) -> Result<Option<SavedProgress>, PersistenceError> {
        Ok(None)
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

/// Runner for the compiled `moodharmony` binary.
pub struct MoodHarmonyProcess;

impl MoodHarmonyProcess {
    /// Runs the binary with `args` and waits for it to exit.
    pub fn spawn_command(args: &[&str]) -> Output {
        Self::spawn_with_stdin(args, "")
    }

    /// Runs the binary with `args`, feeding `input` on stdin.
    pub fn spawn_with_stdin(args: &[&str], input: &str) -> Output {
        let mut child = Command::new(env!("CARGO_BIN_EXE_moodharmony"))
            .args(args)
            .arg("--quiet")
            .env_remove("MOODHARMONY_CATALOG")
            .env_remove("MOODHARMONY_STORE")
            .env_remove("MOODHARMONY_JOURNAL")
            .env_remove("MOODHARMONY_TICK_MS")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn moodharmony");

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .expect("failed to write stdin");
        }
        child.wait_with_output().expect("failed to wait on moodharmony")
    }

    /// Absolute path of a file under `tests/fixtures`.
    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    /// Session runtime flags pointing every file into `dir`.
    pub fn session_files(dir: &Path) -> Vec<String> {
        vec![
            "--store".to_string(),
            dir.join("progress.json").display().to_string(),
            "--journal".to_string(),
            dir.join("journal.jsonl").display().to_string(),
        ]
    }
}
