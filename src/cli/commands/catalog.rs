//! Catalog inspection and validation commands.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::catalog::{Catalog, TransitionDefinition};
use crate::cli::args::{CatalogListArgs, CatalogShowArgs, CatalogValidateArgs, OutputFormat};
use crate::config::CatalogLoader;
use crate::error::{ConfigError, MoodHarmonyError, Severity, ValidationIssue};
use crate::phase::{format_time, phase_start};

/// Loads the catalog at `path`, or the built-in catalog when `None`.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or fails validation.
pub fn load_catalog(path: Option<&Path>) -> Result<Arc<Catalog>, MoodHarmonyError> {
    match path {
        Some(path) => {
            tracing::info!(file = %path.display(), "loading catalog");
            Ok(CatalogLoader::with_defaults().load(path)?.catalog)
        }
        None => Ok(Arc::new(Catalog::builtin()?)),
    }
}

/// Resolves the target emotion id: the explicit one, or the catalog's
/// suggestion for `from`.
///
/// # Errors
///
/// Returns an error if an id is unknown or no target can be suggested.
pub fn pick_target(
    catalog: &Catalog,
    from: &str,
    to: Option<&str>,
) -> Result<String, MoodHarmonyError> {
    catalog.emotion(from)?;
    match to {
        Some(id) => Ok(catalog.emotion(id)?.id.clone()),
        None => catalog
            .suggest_target(from)
            .map(|e| e.id.clone())
            .ok_or_else(|| {
                MoodHarmonyError::Usage(format!(
                    "no positive emotion to suggest as a target for '{from}'; pass one explicitly"
                ))
            }),
    }
}

/// Lists emotions and predefined transitions.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub fn list(args: &CatalogListArgs) -> Result<(), MoodHarmonyError> {
    let catalog = load_catalog(args.config.as_deref())?;

    match args.format {
        OutputFormat::Json => {
            let emotions: Vec<_> = catalog.emotions().collect();
            let transitions: Vec<&TransitionDefinition> =
                catalog.transitions().iter().map(AsRef::as_ref).collect();
            let out = json!({
                "emotions": emotions,
                "transitions": transitions,
                "custom": catalog.policy(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Human => {
            println!("Emotions");
            for e in catalog.emotions() {
                println!(
                    "  {:<2} {:<12} {:<12} {:<9} {:.1}",
                    e.icon.as_deref().unwrap_or(" "),
                    e.id,
                    e.name,
                    e.group,
                    e.intensity
                );
            }
            println!();
            println!("Transitions");
            for t in catalog.transitions() {
                println!(
                    "  {:<22} {:<28} {} phases  {}",
                    t.id(),
                    t.name(),
                    t.phases().len(),
                    format_time(t.total_duration())
                );
            }
        }
    }
    Ok(())
}

/// Shows the transition a session between two emotions would run.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or an id is unknown.
pub fn show(args: &CatalogShowArgs) -> Result<(), MoodHarmonyError> {
    let catalog = load_catalog(args.config.as_deref())?;
    let to = pick_target(&catalog, &args.from, args.to.as_deref())?;
    let definition = catalog.resolve(&args.from, &to)?;
    let predefined = catalog.find_transition(&args.from, &to).is_some();
    let progression = catalog.emotional_progression(&definition);

    match args.format {
        OutputFormat::Json => {
            let out = json!({
                "transition": definition.as_ref(),
                "predefined": predefined,
                "total": definition.total_duration(),
                "progression": progression,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Human => {
            let kind = if predefined { "predefined" } else { "custom" };
            println!("{} ({}, {kind})", definition.name(), definition.id());
            if !definition.description().is_empty() {
                println!("{}", definition.description());
            }
            println!("{}", progression.join(" → "));
            println!();
            for (i, phase) in definition.phases().iter().enumerate() {
                println!(
                    "  {}. {:<16} {:>6}  starts at {}",
                    i + 1,
                    phase.name,
                    format_time(phase.duration),
                    format_time(phase_start(definition.phases(), i))
                );
            }
            println!("  total {}", format_time(definition.total_duration()));
        }
    }
    Ok(())
}

/// Validates catalog files.
///
/// # Errors
///
/// Returns the first file's error, or a validation error in strict mode
/// when a file has warnings.
pub fn validate(args: &CatalogValidateArgs) -> Result<(), MoodHarmonyError> {
    let loader = CatalogLoader::with_defaults();
    for path in &args.files {
        tracing::info!(file = %path.display(), "validating catalog");
        let result = loader.load(path)?;

        if args.strict && !result.warnings.is_empty() {
            let errors = result
                .warnings
                .into_iter()
                .map(|w| ValidationIssue {
                    path: w.location.unwrap_or_default(),
                    message: w.message,
                    severity: Severity::Warning,
                })
                .collect();
            return Err(ConfigError::ValidationError {
                path: path.display().to_string(),
                errors,
            }
            .into());
        }

        for warning in &result.warnings {
            println!("{}: warning: {warning}", path.display());
        }
        println!(
            "{}: ok ({} emotions, {} transitions)",
            path.display(),
            result.catalog.emotions().count(),
            result.catalog.transitions().len()
        );
    }
    Ok(())
}
