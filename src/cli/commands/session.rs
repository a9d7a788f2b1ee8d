//! Interactive session commands
//!
//! A session runs in the foreground: line commands are read from stdin while
//! controller notifications are rendered to stdout. When stdin closes, a
//! paused session resumes, the session runs to completion, and the evaluation
//! is deferred.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use crate::catalog::{Catalog, TransitionDefinition};
use crate::cli::args::{SessionResumeArgs, SessionRunArgs, SessionRuntimeArgs};
use crate::cli::commands::catalog::{load_catalog, pick_target};
use crate::config::SessionSettings;
use crate::error::MoodHarmonyError;
use crate::observability::EventLog;
use crate::phase::format_time;
use crate::session::{
    SaveOutcome, SessionController, SessionEvent, SessionStatus, StopReason,
};
use crate::store::{JournalSink, JsonFileStore, JsonlJournal, MemoryJournal};

const HELP: &str = "\
Commands while the session runs:
  pause | resume          suspend or continue
  next | prev | jump N    move between phases (N counts from 1)
  status                  show where the session is
  save                    save progress and exit
  stop | abandon          end the session without saving
After the session completes:
  feel ID                 how you feel now (emotion id)
  rate N                  how well it worked, 1 to 5
  note TEXT               optional feedback
  submit | later          record the evaluation, or skip it";

/// Starts a new session and drives it from stdin.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded, an emotion id is
/// unknown, or the session cannot start.
pub async fn run(args: &SessionRunArgs) -> Result<(), MoodHarmonyError> {
    let catalog = load_catalog(args.runtime.config.as_deref())?;
    let to = pick_target(&catalog, &args.from, args.to.as_deref())?;
    let definition = catalog.resolve(&args.from, &to)?;

    let controller = build_controller(&args.runtime)?;
    let events = controller.subscribe();
    controller.start(Arc::clone(&definition))?;
    print_header(&catalog, &definition);

    drive(&controller, &catalog, &definition, events).await
}

/// Restores saved progress and drives the session from stdin.
///
/// # Errors
///
/// Returns an error if the store cannot be read, the saved transition cannot
/// be resolved, or the session cannot resume.
pub async fn resume(args: &SessionResumeArgs) -> Result<(), MoodHarmonyError> {
    let catalog = load_catalog(args.runtime.config.as_deref())?;
    let controller = build_controller(&args.runtime)?;
    let events = controller.subscribe();

    if !controller.restore_saved(&catalog)? {
        println!("No saved progress to resume.");
        return Ok(());
    }
    let snapshot = controller.snapshot();
    let Some(definition) = snapshot.definition.clone() else {
        return Ok(());
    };
    print_header(&catalog, &definition);
    println!("Resuming at {}.", format_time(snapshot.elapsed));
    if snapshot.status == SessionStatus::Paused {
        controller.resume()?;
    }

    drive(&controller, &catalog, &definition, events).await
}

/// Builds a controller from the runtime options and environment.
///
/// An unusable journal file is logged and replaced by an in-memory journal.
fn build_controller(
    args: &SessionRuntimeArgs,
) -> Result<Arc<SessionController>, MoodHarmonyError> {
    let mut settings = SessionSettings::from_env();
    if let Some(tick_ms) = args.tick_ms {
        settings = settings.with_tick_ms(tick_ms);
    }
    if let Some(path) = &args.store {
        settings.store_path.clone_from(path);
    }
    if let Some(path) = &args.journal {
        settings.journal_path.clone_from(path);
    }
    if args.events_file.is_some() {
        settings.events_file.clone_from(&args.events_file);
    }

    let journal: Arc<dyn JournalSink> = match JsonlJournal::open(&settings.journal_path) {
        Ok(journal) => Arc::new(journal),
        Err(error) => {
            warn!(%error, path = %settings.journal_path.display(), "journal unavailable, evaluations will not be kept");
            Arc::new(MemoryJournal::new())
        }
    };

    let mut builder = SessionController::builder()
        .store(Arc::new(JsonFileStore::new(settings.store_path.clone())))
        .journal(journal)
        .settings(&settings);
    if let Some(path) = &settings.events_file {
        builder = builder.event_log(Arc::new(EventLog::from_file(path)?));
    }
    Ok(builder.build())
}

// ============================================================================
// Driver Loop
// ============================================================================

async fn drive(
    controller: &SessionController,
    catalog: &Catalog,
    definition: &TransitionDefinition,
    mut events: UnboundedReceiver<SessionEvent>,
) -> Result<(), MoodHarmonyError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                render_event(&event, catalog, definition);
                if !stdin_open && matches!(event, SessionEvent::SessionCompleted { .. }) {
                    controller.defer_evaluation()?;
                }
            }
            line = lines.next_line(), if stdin_open => {
                if let Some(line) = line? {
                    if let Err(e) = handle_line(controller, catalog, &line) {
                        println!("error: {e}");
                    }
                } else {
                    debug!("stdin closed, session continues unattended");
                    stdin_open = false;
                    match controller.status() {
                        SessionStatus::Paused => controller.resume()?,
                        SessionStatus::Completed => controller.defer_evaluation()?,
                        _ => {}
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                interrupt(controller)?;
            }
        }

        if controller.status() == SessionStatus::Idle {
            while let Ok(event) = events.try_recv() {
                render_event(&event, catalog, definition);
            }
            return Ok(());
        }
    }
}

/// Saves an active session, or defers a pending evaluation, on Ctrl+C.
fn interrupt(controller: &SessionController) -> Result<(), MoodHarmonyError> {
    match controller.status() {
        SessionStatus::Running | SessionStatus::Paused => {
            report_save(&controller.save_progress()?);
        }
        SessionStatus::Completed => controller.defer_evaluation()?,
        SessionStatus::Idle => {}
    }
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

/// A line command typed during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Pause,
    Resume,
    Next,
    Previous,
    /// Zero-based phase index
    Jump(usize),
    Status,
    Save,
    Stop,
    Abandon,
    Feel(String),
    Rate(u8),
    Note(String),
    Submit,
    Later,
    Help,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));

    let command = match word.to_ascii_lowercase().as_str() {
        "pause" | "p" => Command::Pause,
        "resume" | "r" | "play" => Command::Resume,
        "next" | "n" => Command::Next,
        "prev" | "previous" => Command::Previous,
        "jump" | "j" => {
            let n: usize = rest
                .parse()
                .map_err(|_| format!("'{rest}' is not a phase number"))?;
            if n == 0 {
                return Err("phases are numbered from 1".to_string());
            }
            Command::Jump(n - 1)
        }
        "status" | "s" => Command::Status,
        "save" => Command::Save,
        "stop" => Command::Stop,
        "abandon" => Command::Abandon,
        "feel" if !rest.is_empty() => Command::Feel(rest.to_string()),
        "feel" => return Err("usage: feel <emotion id>".to_string()),
        "rate" => Command::Rate(
            rest.parse()
                .map_err(|_| format!("'{rest}' is not a rating from 1 to 5"))?,
        ),
        "note" => Command::Note(rest.to_string()),
        "submit" => Command::Submit,
        "later" | "skip" => Command::Later,
        "help" | "?" => Command::Help,
        other => return Err(format!("unknown command '{other}' (type 'help')")),
    };
    Ok(command)
}

fn handle_line(
    controller: &SessionController,
    catalog: &Catalog,
    line: &str,
) -> Result<(), MoodHarmonyError> {
    if line.trim().is_empty() {
        return Ok(());
    }
    let command = parse_command(line).map_err(MoodHarmonyError::Usage)?;
    execute(controller, catalog, command)
}

fn execute(
    controller: &SessionController,
    catalog: &Catalog,
    command: Command,
) -> Result<(), MoodHarmonyError> {
    match command {
        Command::Pause => controller.pause()?,
        Command::Resume => controller.resume()?,
        Command::Next => controller.next_phase()?,
        Command::Previous => controller.previous_phase()?,
        Command::Jump(index) => controller.jump_to_phase(index)?,
        Command::Status => print_status(controller),
        Command::Save => report_save(&controller.save_progress()?),
        Command::Stop => controller.stop()?,
        Command::Abandon => controller.abandon()?,
        Command::Feel(id) => {
            let emotion = catalog.emotion(&id)?;
            controller.record_current_emotion(&emotion.id)?;
            println!("Noted: {}.", emotion.name);
        }
        Command::Rate(rating) => controller.record_effectiveness(rating)?,
        Command::Note(text) => controller.record_feedback(&text)?,
        Command::Submit => {
            let record = controller.submit_evaluation()?;
            println!(
                "Evaluation recorded: feeling {}, rated {}/5.",
                record.current_emotion, record.effectiveness
            );
        }
        Command::Later => controller.defer_evaluation()?,
        Command::Help => println!("{HELP}"),
    }
    Ok(())
}

// ============================================================================
// Rendering
// ============================================================================

fn print_header(catalog: &Catalog, definition: &TransitionDefinition) {
    println!("{}", definition.name());
    println!("{}", catalog.emotional_progression(definition).join(" → "));
    println!(
        "{} phases, {} total. Type 'help' for commands.",
        definition.phases().len(),
        format_time(definition.total_duration())
    );
}

fn print_status(controller: &SessionController) {
    let snapshot = controller.snapshot();
    let Some(definition) = &snapshot.definition else {
        println!("No session.");
        return;
    };
    println!(
        "{}: phase {}/{} ({}), {} elapsed, {} left",
        snapshot.status,
        snapshot.phase_index + 1,
        definition.phases().len(),
        snapshot.phase_name().unwrap_or_default(),
        format_time(snapshot.elapsed),
        format_time(snapshot.remaining)
    );
}

fn report_save(outcome: &SaveOutcome) {
    match outcome {
        SaveOutcome::Persisted(record) => println!(
            "Progress saved at {}. Continue later with 'moodharmony session resume'.",
            format_time(record.elapsed)
        ),
        SaveOutcome::NotPersisted { error, .. } => {
            println!("Progress could not be saved: {error}");
        }
    }
}

fn render_event(event: &SessionEvent, catalog: &Catalog, definition: &TransitionDefinition) {
    match event {
        SessionEvent::PhaseChanged { index, name } => {
            println!();
            println!(
                "▶ Phase {}/{}: {name}",
                index + 1,
                definition.phases().len()
            );
        }
        SessionEvent::ProgressChanged { elapsed, .. } => {
            let total = definition.total_duration();
            let percent = elapsed.saturating_mul(100).checked_div(total).unwrap_or(100);
            print!(
                "\r  {} / {}  {percent:>3}%",
                format_time(*elapsed),
                format_time(total)
            );
            let _ = std::io::stdout().flush();
        }
        SessionEvent::Paused { elapsed } => {
            println!("\nPaused at {}. Type 'resume' to continue.", format_time(*elapsed));
        }
        SessionEvent::Resumed { .. } => println!("\nResumed."),
        SessionEvent::SessionCompleted { .. } => {
            println!("\n\nSession complete. How do you feel now?");
            let ids: Vec<&str> = catalog.emotions().map(|e| e.id.as_str()).collect();
            println!("  feel <{}>", ids.join("|"));
            println!("  rate <1-5>, note <text>, then submit (or later)");
        }
        SessionEvent::SessionStopped { reason } => match reason {
            StopReason::Stopped => println!("\nSession stopped."),
            StopReason::Abandoned => println!("\nSession abandoned."),
            StopReason::Saved => {}
        },
        SessionEvent::EvaluationDeferred => println!("Evaluation skipped."),
        SessionEvent::SessionStarted { .. }
        | SessionEvent::ProgressSaved { .. }
        | SessionEvent::EvaluationSubmitted { .. } => {}
    }
}
