//! Catalog validation
//!
//! Checks a parsed [`CatalogConfig`] before a catalog is built from it.
//! Validation collects ALL issues rather than stopping at the first one, so
//! a user fixing a catalog file sees everything at once.

use std::collections::HashSet;

use strsim::damerau_levenshtein;

use crate::catalog::{Phase, builtin};
use crate::config::loader::CatalogLimits;
use crate::config::schema::{CatalogConfig, TransitionConfig};
use crate::error::{Severity, ValidationIssue};
use crate::phase::checked_total_duration;

/// Maximum edit distance for "did you mean" hints in validation messages.
const SUGGESTION_DISTANCE: usize = 3;

// ============================================================================
// Public API
// ============================================================================

/// Result of catalog validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Catalog validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a catalog file and returns every issue found.
    pub fn validate(&mut self, config: &CatalogConfig, limits: &CatalogLimits) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        let known = self.validate_emotions(config);
        self.validate_transitions(config, &known, limits);
        if let Some(policy) = &config.custom {
            self.validate_phases(&policy.phases, "custom.phases");
            for (field, template) in [
                ("custom.name_template", &policy.name_template),
                ("custom.description_template", &policy.description_template),
            ] {
                if !template.contains("{from}") || !template.contains("{to}") {
                    self.add_warning(
                        field,
                        "Template does not mention both {from} and {to}; \
                         synthesized transitions may share a name",
                    );
                }
            }
        }
        self.validate_limits(config, limits);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Emotions
    // ========================================================================

    /// Validates the emotion table and returns every usable emotion id,
    /// including built-in ones when the file extends the built-in catalog.
    fn validate_emotions(&mut self, config: &CatalogConfig) -> Vec<String> {
        let mut known: Vec<String> = if config.builtin {
            builtin::emotions().into_iter().map(|e| e.id).collect()
        } else {
            Vec::new()
        };

        if config.emotions.is_empty() && !config.builtin {
            self.add_error("emotions", "Catalog defines no emotions");
        }

        let mut seen = HashSet::new();
        for (i, emotion) in config.emotions.iter().enumerate() {
            let path = format!("emotions[{i}]");
            if emotion.id.trim().is_empty() {
                self.add_error(&format!("{path}.id"), "Emotion id cannot be empty");
                continue;
            }
            if !seen.insert(emotion.id.as_str()) {
                self.add_error(
                    &format!("{path}.id"),
                    &format!("Duplicate emotion id '{}'", emotion.id),
                );
            }
            if emotion.name.trim().is_empty() {
                self.add_error(&format!("{path}.name"), "Emotion name cannot be empty");
            }
            if !(0.0..=1.0).contains(&emotion.intensity) {
                self.add_error(
                    &format!("{path}.intensity"),
                    &format!(
                        "Intensity {} is outside the range 0.0 to 1.0",
                        emotion.intensity
                    ),
                );
            }
            if !known.contains(&emotion.id) {
                known.push(emotion.id.clone());
            }
        }
        known
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    fn validate_transitions(
        &mut self,
        config: &CatalogConfig,
        known: &[String],
        limits: &CatalogLimits,
    ) {
        let mut seen = HashSet::new();
        for (i, transition) in config.transitions.iter().enumerate() {
            let path = format!("transitions[{i}]");
            let id = transition.effective_id();
            if !seen.insert(id.clone()) {
                self.add_error(&path, &format!("Duplicate transition id '{id}'"));
            }

            self.validate_endpoint(&transition.from, known, &format!("{path}.from"));
            self.validate_endpoint(&transition.to, known, &format!("{path}.to"));
            if transition.from == transition.to {
                self.add_warning(
                    &path,
                    &format!("Transition '{id}' starts and ends at the same emotion"),
                );
            }

            self.validate_phases(&transition.phases, &format!("{path}.phases"));
            if transition.phases.len() > limits.max_phases {
                self.add_error(
                    &format!("{path}.phases"),
                    &format!(
                        "Too many phases: {} (maximum: {}). \
                         Set MOODHARMONY_MAX_PHASES to increase the limit.",
                        transition.phases.len(),
                        limits.max_phases
                    ),
                );
            }
            self.validate_declared_duration(transition, &path);
        }
    }

    fn validate_endpoint(&mut self, id: &str, known: &[String], path: &str) {
        if known.iter().any(|k| k == id) {
            return;
        }
        let hint = known
            .iter()
            .map(|k| (k, damerau_levenshtein(id, k)))
            .filter(|(_, d)| *d <= SUGGESTION_DISTANCE)
            .min_by_key(|(_, d)| *d)
            .map_or_else(String::new, |(k, _)| format!(" (did you mean '{k}'?)"));
        self.add_error(path, &format!("Unknown emotion '{id}'{hint}"));
    }

    fn validate_phases(&mut self, phases: &[Phase], path: &str) {
        if phases.is_empty() {
            self.add_error(path, "At least one phase is required");
            return;
        }
        let mut names = HashSet::new();
        for (i, phase) in phases.iter().enumerate() {
            if phase.name.trim().is_empty() {
                self.add_error(&format!("{path}[{i}].name"), "Phase name cannot be empty");
            } else if !names.insert(phase.name.as_str()) {
                self.add_warning(
                    &format!("{path}[{i}].name"),
                    &format!("Phase name '{}' is used more than once", phase.name),
                );
            }
            if phase.duration == 0 {
                self.add_error(
                    &format!("{path}[{i}].duration"),
                    "Phase duration must be greater than zero",
                );
            }
        }
        if checked_total_duration(phases).is_none() {
            self.add_error(path, "Total phase duration is too large to represent");
        }
    }

    fn validate_declared_duration(&mut self, transition: &TransitionConfig, path: &str) {
        let Some(declared) = transition.duration else {
            return;
        };
        let Some(total) = transition.phase_total() else {
            return;
        };
        if declared != total {
            self.add_warning(
                &format!("{path}.duration"),
                &format!(
                    "Declared duration {declared}s differs from the phase total {total}s; \
                     the phase total is used"
                ),
            );
        }
    }

    // ========================================================================
    // Limits
    // ========================================================================

    fn validate_limits(&mut self, config: &CatalogConfig, limits: &CatalogLimits) {
        if config.transitions.len() > limits.max_transitions {
            self.add_error(
                "transitions",
                &format!(
                    "Too many transitions: {} (maximum: {}). \
                     Set MOODHARMONY_MAX_TRANSITIONS to increase the limit.",
                    config.transitions.len(),
                    limits.max_transitions
                ),
            );
        }
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
