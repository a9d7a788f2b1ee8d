mod common;

use std::sync::Arc;
use std::time::Duration;

use moodharmony::catalog::Catalog;
use moodharmony::observability::EventLog;
use moodharmony::session::{SaveOutcome, SessionController, SessionEvent, SessionStatus};
use moodharmony::store::{JsonFileStore, JsonlJournal, MemoryJournal, ProgressStore};
use tokio::time::sleep;

use common::{FailingStore, anxiety_to_calm, drain, short_transition};

#[tokio::test(start_paused = true)]
async fn saved_progress_restores_into_a_paused_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("progress.json");
    let catalog = Catalog::builtin().unwrap();

    let controller = SessionController::builder()
        .store(Arc::new(JsonFileStore::new(path.clone())))
        .build();
    controller.start(anxiety_to_calm()).unwrap();
    sleep(Duration::from_millis(12_500)).await;

    let outcome = controller.save_progress().unwrap();
    assert!(outcome.is_persisted());
    assert_eq!(outcome.record().elapsed, 12);
    assert_eq!(outcome.record().phase_index, 1);
    assert_eq!(controller.status(), SessionStatus::Idle);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["transitionId"], "anxiety-to-calm");
    assert_eq!(raw["elapsedTime"], 12);
    assert_eq!(raw["currentPhase"], 1);

    let restored = SessionController::builder()
        .store(Arc::new(JsonFileStore::new(path.clone())))
        .build();
    let mut rx = restored.subscribe();
    assert!(restored.restore_saved(&catalog).unwrap());

    let snapshot = restored.snapshot();
    assert_eq!(snapshot.status, SessionStatus::Paused);
    assert_eq!(snapshot.elapsed, 12);
    assert_eq!(snapshot.phase_index, 1);
    assert!(!path.exists(), "store should be cleared after restore");

    let events = drain(&mut rx);
    assert!(matches!(events[0], SessionEvent::SessionStarted { .. }));
    assert!(matches!(
        events[1],
        SessionEvent::ProgressChanged { elapsed: 12, .. }
    ));
    assert_eq!(events[2], SessionEvent::Paused { elapsed: 12 });

    restored.resume().unwrap();
    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(restored.snapshot().elapsed, 13);
}

#[tokio::test(start_paused = true)]
async fn synthesized_transition_survives_save_and_restore() {
    let catalog = Catalog::builtin().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path().join("progress.json")));

    let controller = SessionController::builder().store(store.clone()).build();
    controller
        .start(catalog.resolve("joy", "anxiety").unwrap())
        .unwrap();
    controller.jump_to_phase(1).unwrap();
    controller.save_progress().unwrap();

    let restored = SessionController::builder().store(store).build();
    assert!(restored.restore_saved(&catalog).unwrap());
    let snapshot = restored.snapshot();
    assert_eq!(snapshot.elapsed, 8);
    assert_eq!(
        snapshot.definition.as_ref().map(|d| d.id()),
        Some("joy-to-anxiety")
    );
}

#[tokio::test(start_paused = true)]
async fn restore_with_empty_store_reports_nothing_to_resume() {
    let catalog = Catalog::builtin().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let controller = SessionController::builder()
        .store(Arc::new(JsonFileStore::new(dir.path().join("none.json"))))
        .build();

    assert!(!controller.restore_saved(&catalog).unwrap());
    assert_eq!(controller.status(), SessionStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn failed_save_still_resets_the_session() {
    let controller = SessionController::builder()
        .store(Arc::new(FailingStore))
        .build();
    let mut rx = controller.subscribe();
    controller.start(anxiety_to_calm()).unwrap();
    sleep(Duration::from_millis(3_500)).await;

    let outcome = controller.save_progress().unwrap();
    let SaveOutcome::NotPersisted { record, error } = &outcome else {
        panic!("expected NotPersisted, got {outcome:?}");
    };
    assert_eq!(record.elapsed, 3);
    assert!(error.to_string().contains("disk full"));
    assert_eq!(controller.status(), SessionStatus::Idle);

    let events = drain(&mut rx);
    assert!(events.contains(&SessionEvent::ProgressSaved { persisted: false }));

    sleep(Duration::from_secs(5)).await;
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn submitted_evaluation_reaches_the_journal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/journal.jsonl");
    let journal = Arc::new(JsonlJournal::open(&path).unwrap());

    let controller = SessionController::builder().journal(journal).build();
    controller.start(short_transition(1, 2)).unwrap();
    sleep(Duration::from_millis(3_500)).await;

    controller.record_current_emotion("calm").unwrap();
    controller.record_effectiveness(5).unwrap();
    controller.record_feedback("lighter than before").unwrap();
    controller.submit_evaluation().unwrap();

    let entries = JsonlJournal::read_all(&path).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].transition_id, "short");
    assert_eq!(entries[0].from, "anxiety");
    assert_eq!(entries[0].evaluation.effectiveness, 5);
    assert_eq!(
        entries[0].evaluation.feedback.as_deref(),
        Some("lighter than before")
    );
}

#[tokio::test(start_paused = true)]
async fn deferred_evaluation_is_not_journaled() {
    let journal = Arc::new(MemoryJournal::new());
    let controller = SessionController::builder()
        .journal(journal.clone())
        .build();
    controller.start(short_transition(1, 1)).unwrap();
    sleep(Duration::from_millis(2_500)).await;

    controller.record_effectiveness(2).unwrap();
    controller.defer_evaluation().unwrap();
    assert_eq!(controller.status(), SessionStatus::Idle);
    assert!(journal.entries().is_empty());
}

#[tokio::test(start_paused = true)]
async fn event_log_writes_one_line_per_event() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let log = Arc::new(EventLog::from_file(&path).unwrap());

    let controller = SessionController::builder()
        .event_log(Arc::clone(&log))
        .build();
    controller.start(short_transition(1, 1)).unwrap();
    sleep(Duration::from_millis(2_500)).await;
    controller.defer_evaluation().unwrap();
    assert_eq!(log.event_count(), 6);
    drop(controller);
    drop(log);

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let kinds: Vec<&str> = lines.iter().map(|l| l["type"].as_str().unwrap()).collect();
    assert_eq!(
        kinds,
        [
            "SessionStarted",
            "PhaseChanged",
            "ProgressChanged",
            "ProgressChanged",
            "SessionCompleted",
            "EvaluationDeferred",
        ]
    );
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line["sequence"].as_u64(), u64::try_from(i).ok());
        assert!(line["timestamp"].is_string());
    }
}

#[test]
fn json_file_store_treats_missing_file_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("deep/progress.json"));
    assert!(store.load().unwrap().is_none());
    store.clear().unwrap();
}
