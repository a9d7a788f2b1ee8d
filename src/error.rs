//! Error types for `moodharmony`
//!
//! This module provides the error hierarchy for catalog lookups, session
//! state transitions, evaluation capture, persistence, and configuration
//! loading, plus the exit codes used by the CLI.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `moodharmony` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Catalog error (unknown emotion or transition)
    pub const CATALOG_ERROR: i32 = 4;

    /// Session engine error (invalid state transition)
    pub const SESSION_ERROR: i32 = 5;

    /// Persistence error (progress store or journal unavailable)
    pub const PERSISTENCE_ERROR: i32 = 6;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `moodharmony` operations.
///
/// Aggregates all domain-specific errors and maps them to exit codes.
#[derive(Debug, Error)]
pub enum MoodHarmonyError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Catalog lookup error
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Session engine error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Evaluation capture error
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// Persistence error
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Invalid command-line usage
    #[error("usage error: {0}")]
    Usage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MoodHarmonyError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) => ExitCode::CONFIG_ERROR,
            Self::Catalog(_) => ExitCode::CATALOG_ERROR,
            Self::Session(SessionError::Catalog(_)) => ExitCode::CATALOG_ERROR,
            Self::Session(SessionError::Persistence(_)) | Self::Persistence(_) => {
                ExitCode::PERSISTENCE_ERROR
            }
            Self::Session(_) => ExitCode::SESSION_ERROR,
            Self::Evaluation(_) => ExitCode::ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Catalog file loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the catalog file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Catalog validation failed
    #[error("validation failed for {path}")]
    ValidationError {
        /// Path to the catalog file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced catalog file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Environment variable referenced in the catalog is not set
    #[error("environment variable '{var}' not set (referenced at {location})")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Location where it was referenced
        location: String,
    },

    /// Validated entries still failed to form a catalog
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during catalog validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "transitions[2].phases[0]")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Validation failure that prevents the catalog from being used
    Error,
    /// Potential issue that does not prevent loading
    Warning,
}

// ============================================================================
// Catalog Errors
// ============================================================================

/// Transition catalog lookup errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Emotion id is not present in the catalog
    #[error("unknown emotion '{id}'{}", suggestion_suffix(.suggestion.as_deref()))]
    UnknownEmotion {
        /// The id that was looked up
        id: String,
        /// Closest known id, if any is close enough
        suggestion: Option<String>,
    },

    /// Transition id is not present in the catalog and cannot be synthesized
    #[error("unknown transition '{0}'")]
    UnknownTransition(String),

    /// Transition definition violates a structural invariant
    #[error("invalid transition '{id}': {reason}")]
    InvalidDefinition {
        /// Transition id
        id: String,
        /// What is wrong with it
        reason: String,
    },
}

fn suggestion_suffix(suggestion: Option<&str>) -> String {
    suggestion.map_or_else(String::new, |s| format!(" (did you mean '{s}'?)"))
}

// ============================================================================
// Session Errors
// ============================================================================

/// Session controller errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Operation is not valid in the current session state
    #[error("cannot {operation} while session is {state}")]
    InvalidStateTransition {
        /// Operation that was attempted
        operation: &'static str,
        /// State the session was in
        state: &'static str,
    },

    /// Operation needs a tokio runtime to drive the tick source
    #[error("no async runtime available to drive the session clock")]
    NoRuntime,

    /// Definition could not be resolved
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Evaluation could not be submitted
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// Progress store failed
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

// ============================================================================
// Evaluation Errors
// ============================================================================

/// Evaluation capture errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvaluationError {
    /// Submit attempted without all required fields
    #[error("evaluation incomplete: missing {}", .missing.join(", "))]
    IncompleteEvaluation {
        /// Names of the missing required fields
        missing: Vec<&'static str>,
    },

    /// Effectiveness rating outside 1..=5
    #[error("invalid effectiveness rating {0} (expected 1 to 5)")]
    InvalidRating(u8),
}

// ============================================================================
// Persistence Errors
// ============================================================================

/// Progress store and journal errors.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// I/O error while reading or writing the store
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized
    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Store cannot accept writes
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `moodharmony` operations.
pub type Result<T> = std::result::Result<T, MoodHarmonyError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::CATALOG_ERROR, 4);
        assert_eq!(ExitCode::SESSION_ERROR, 5);
        assert_eq!(ExitCode::PERSISTENCE_ERROR, 6);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_session_error_exit_code() {
        let err: MoodHarmonyError = SessionError::InvalidStateTransition {
            operation: "pause",
            state: "idle",
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::SESSION_ERROR);
    }

    #[test]
    fn test_catalog_error_through_session_exit_code() {
        let err: MoodHarmonyError = SessionError::Catalog(CatalogError::UnknownEmotion {
            id: "glee".to_string(),
            suggestion: None,
        })
        .into();
        assert_eq!(err.exit_code(), ExitCode::CATALOG_ERROR);
    }

    #[test]
    fn test_persistence_error_exit_code() {
        let err: MoodHarmonyError =
            PersistenceError::Unavailable("read-only".to_string()).into();
        assert_eq!(err.exit_code(), ExitCode::PERSISTENCE_ERROR);
    }

    #[test]
    fn test_config_error_exit_code() {
        let err: MoodHarmonyError = ConfigError::MissingFile {
            path: PathBuf::from("/test"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: MoodHarmonyError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_invalid_state_display() {
        let err = SessionError::InvalidStateTransition {
            operation: "resume",
            state: "running",
        };
        assert_eq!(err.to_string(), "cannot resume while session is running");
    }

    #[test]
    fn test_unknown_emotion_display_with_suggestion() {
        let err = CatalogError::UnknownEmotion {
            id: "anxeity".to_string(),
            suggestion: Some("anxiety".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "unknown emotion 'anxeity' (did you mean 'anxiety'?)"
        );
    }

    #[test]
    fn test_unknown_emotion_display_without_suggestion() {
        let err = CatalogError::UnknownEmotion {
            id: "xyz".to_string(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "unknown emotion 'xyz'");
    }

    #[test]
    fn test_incomplete_evaluation_display() {
        let err = EvaluationError::IncompleteEvaluation {
            missing: vec!["current emotion", "effectiveness"],
        };
        assert_eq!(
            err.to_string(),
            "evaluation incomplete: missing current emotion, effectiveness"
        );
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "transitions[0].phases".to_string(),
            message: "transition has no phases".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(
            issue.to_string(),
            "error: transition has no phases at transitions[0].phases"
        );
    }

    #[test]
    fn test_validation_issue_warning_display() {
        let issue = ValidationIssue {
            path: "transitions[1].duration".to_string(),
            message: "declared duration differs".to_string(),
            severity: Severity::Warning,
        };
        assert_eq!(
            issue.to_string(),
            "warning: declared duration differs at transitions[1].duration"
        );
    }
}
