//! Runtime settings for session playback.

use std::path::PathBuf;
use std::time::Duration;

use super::loader::env_or;

/// Default wall-clock length of one tick in milliseconds.
pub const DEFAULT_TICK_MS: u64 = 1000;

/// Default location of the saved-progress file.
pub const DEFAULT_STORE_PATH: &str = ".moodharmony/progress.json";

/// Default location of the evaluation journal.
pub const DEFAULT_JOURNAL_PATH: &str = ".moodharmony/journal.jsonl";

/// Settings that shape a running session without changing its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Wall-clock length of one tick.
    pub tick_interval: Duration,

    /// Where saved progress is kept.
    pub store_path: PathBuf,

    /// Where submitted evaluations are appended.
    pub journal_path: PathBuf,

    /// Optional JSONL file receiving every session event.
    pub events_file: Option<PathBuf>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            journal_path: PathBuf::from(DEFAULT_JOURNAL_PATH),
            events_file: None,
        }
    }
}

impl SessionSettings {
    /// Builds settings from the environment, falling back to defaults.
    ///
    /// Reads `MOODHARMONY_TICK_MS`. A zero interval is replaced by the
    /// default because the tick source cannot run with a zero period.
    #[must_use]
    pub fn from_env() -> Self {
        let tick_ms = env_or("MOODHARMONY_TICK_MS", DEFAULT_TICK_MS);
        Self::default().with_tick_ms(tick_ms)
    }

    /// Overrides the tick interval. Zero keeps the current interval.
    #[must_use]
    pub const fn with_tick_ms(mut self, tick_ms: u64) -> Self {
        if tick_ms > 0 {
            self.tick_interval = Duration::from_millis(tick_ms);
        }
        self
    }

    /// Overrides the tick interval.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.tick_interval = interval;
        }
        self
    }
}
