//! Structured session event log.
//!
//! Session notifications are written as newline-delimited JSON (JSONL)
//! with a monotonically increasing sequence number and a timestamp.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::session::SessionEvent;

// ---------------------------------------------------------------------------
// Envelope (adds sequence number and timestamp via serde flatten)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EventEnvelope<'a> {
    /// Zero-based, monotonically increasing sequence counter.
    sequence: u64,
    /// When the event was written.
    timestamp: DateTime<Utc>,
    /// The wrapped event (flattened into the same JSON object).
    #[serde(flatten)]
    event: &'a SessionEvent,
}

#[derive(Debug)]
struct Stamped {
    sequence: u64,
    timestamp: DateTime<Utc>,
    event: SessionEvent,
}

/// Events with their sequence numbers assigned, waiting to be written.
#[derive(Debug)]
pub struct StampedEvents(Vec<Stamped>);

// ---------------------------------------------------------------------------
// Log
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Every event gets the next sequence number, is serialized as a single
/// JSON line, and the underlying writer is flushed after each batch.
/// Serialization or I/O failures are silently dropped.
pub struct EventLog {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

// Box<dyn Write> is not Debug
impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventLog {
    /// Creates a log that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates a log that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a log that writes to a file at `path`, truncating it.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Writes an event as a single JSONL line.
    pub fn emit(&self, event: &SessionEvent) {
        self.write(&self.stamp(vec![event.clone()]));
    }

    /// Assigns sequence numbers and timestamps without touching the writer.
    ///
    /// Callers stamp while their own state is locked and [`write`](Self::write)
    /// after releasing it. Lines from concurrent batches may land out of
    /// order; the sequence numbers keep the stamping order.
    pub fn stamp(&self, events: Vec<SessionEvent>) -> StampedEvents {
        StampedEvents(
            events
                .into_iter()
                .map(|event| Stamped {
                    sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
                    timestamp: Utc::now(),
                    event,
                })
                .collect(),
        )
    }

    /// Writes a stamped batch, one JSONL line per event, then flushes.
    pub fn write(&self, batch: &StampedEvents) {
        let Ok(mut w) = self.writer.lock() else {
            return;
        };
        for stamped in &batch.0 {
            let envelope = EventEnvelope {
                sequence: stamped.sequence,
                timestamp: stamped.timestamp,
                event: &stamped.event,
            };
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
            }
        }
        let _ = w.flush();
    }

    /// Returns the number of events written so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;
    use crate::session::StopReason;

    #[derive(Clone)]
    struct TestWriter(Arc<StdMutex<Vec<u8>>>);

    impl TestWriter {
        fn new() -> Self {
            Self(Arc::new(StdMutex::new(Vec::new())))
        }

        fn lines(&self) -> Vec<serde_json::Value> {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf)
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn log_writes_sequenced_jsonl() {
        let tw = TestWriter::new();
        let log = EventLog::new(Box::new(tw.clone()));
        log.emit(&SessionEvent::PhaseChanged {
            index: 1,
            name: "Stabilisation".to_owned(),
        });
        log.emit(&SessionEvent::SessionStopped {
            reason: StopReason::Stopped,
        });

        assert_eq!(log.event_count(), 2);
        let lines = tw.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["sequence"], 0);
        assert_eq!(lines[0]["type"], "PhaseChanged");
        assert_eq!(lines[0]["name"], "Stabilisation");
        assert!(lines[0]["timestamp"].is_string());
        assert_eq!(lines[1]["sequence"], 1);
        assert_eq!(lines[1]["reason"], "stopped");
    }

    #[test]
    fn unit_variant_serializes() {
        let tw = TestWriter::new();
        let log = EventLog::new(Box::new(tw.clone()));
        log.emit(&SessionEvent::EvaluationDeferred);
        assert_eq!(tw.lines()[0]["type"], "EvaluationDeferred");
    }

    #[test]
    fn log_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let log = EventLog::from_file(&path).unwrap();
        log.emit(&SessionEvent::Resumed { elapsed: 3 });
        drop(log);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"Resumed\""));
    }

    #[test]
    fn stamped_batch_keeps_sequence_order() {
        let tw = TestWriter::new();
        let log = EventLog::new(Box::new(tw.clone()));
        let first = log.stamp(vec![SessionEvent::Paused { elapsed: 4 }]);
        let second = log.stamp(vec![
            SessionEvent::Resumed { elapsed: 4 },
            SessionEvent::ProgressChanged {
                elapsed: 5,
                fraction: 0.5,
            },
        ]);
        assert!(tw.lines().is_empty());

        log.write(&second);
        log.write(&first);

        let lines = tw.lines();
        let sequences: Vec<_> = lines.iter().map(|l| l["sequence"].clone()).collect();
        assert_eq!(sequences, [1, 2, 0]);
        assert_eq!(lines[2]["type"], "Paused");
        assert_eq!(log.event_count(), 3);
    }
}
