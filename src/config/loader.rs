//! Catalog loader
//!
//! Loading pipeline for YAML catalog files:
//! 1. Size limit check and BOM strip
//! 2. Environment variable expansion (pre-parse, on raw text)
//! 3. YAML parsing
//! 4. Deserialization to [`CatalogConfig`]
//! 5. Validation
//! 6. Build and freeze the [`Catalog`] with `Arc`

use std::path::Path;
use std::sync::Arc;

use serde_yaml::Value;
use tracing::{debug, warn};

use crate::catalog::{Catalog, TransitionDefinition, builtin};
use crate::config::schema::{CatalogConfig, TransitionConfig};
use crate::config::validation::Validator;
use crate::error::{CatalogError, ConfigError};

// ============================================================================
// Public API
// ============================================================================

/// Limits on catalog size to prevent resource exhaustion.
#[derive(Debug, Clone)]
pub struct CatalogLimits {
    /// Maximum number of predefined transitions.
    pub max_transitions: usize,

    /// Maximum number of phases per transition.
    pub max_phases: usize,

    /// Maximum catalog file size in bytes.
    pub max_catalog_size: usize,
}

impl Default for CatalogLimits {
    fn default() -> Self {
        Self {
            max_transitions: env_or("MOODHARMONY_MAX_TRANSITIONS", 500),
            max_phases: env_or("MOODHARMONY_MAX_PHASES", 50),
            max_catalog_size: env_or("MOODHARMONY_MAX_CATALOG_SIZE", 1024 * 1024),
        }
    }
}

/// Result of loading a catalog file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated catalog.
    pub catalog: Arc<Catalog>,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during catalog loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} at {location}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Catalog loader.
///
/// Handles the full pipeline from YAML file to frozen [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogLoader {
    limits: CatalogLimits,
}

impl CatalogLoader {
    /// Creates a loader with the given limits.
    #[must_use]
    pub const fn new(limits: CatalogLimits) -> Self {
        Self { limits }
    }

    /// Creates a loader with limits taken from the environment.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Loads a catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read or exceeds the size limit
    /// - A required environment variable is unset
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let file_size =
            usize::try_from(metadata.len()).unwrap_or(self.limits.max_catalog_size);
        if file_size > self.limits.max_catalog_size {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{file_size} bytes"),
                expected: format!("at most {} bytes", self.limits.max_catalog_size),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        self.load_str(&raw, path)
    }

    /// Loads a catalog from text. `path` is used for messages only.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus file access.
    pub fn load_str(&self, raw: &str, path: &Path) -> Result<LoadResult, ConfigError> {
        let mut warnings = Vec::new();

        // Handle UTF-8 BOM
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        // Stage 1: Variable expansion (before YAML parsing)
        let (substituted, expansion_warnings) =
            expand_vars(raw, path, |name| std::env::var(name).ok())?;
        warnings.extend(expansion_warnings);

        // Stage 2: YAML parsing
        let root: Value =
            serde_yaml::from_str(&substituted).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;
        if root.is_null() {
            return Err(ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: "Catalog file is empty".to_string(),
            });
        }

        // Stage 3: Deserialize to typed config
        let config: CatalogConfig =
            serde_yaml::from_value(root).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: format!("Failed to deserialize catalog: {e}"),
            })?;

        // Stage 4: Validation
        let validation = Validator::new().validate(&config, &self.limits);
        if validation.has_errors() {
            return Err(ConfigError::ValidationError {
                path: path.display().to_string(),
                errors: validation.errors,
            });
        }
        for issue in validation.warnings {
            warn!(path = %issue.path, "{}", issue.message);
            warnings.push(LoadWarning {
                message: issue.message,
                location: Some(issue.path),
            });
        }

        // Stage 5: Build and freeze
        let catalog = build_catalog(config)?;
        debug!(
            path = %path.display(),
            emotions = catalog.emotions().count(),
            transitions = catalog.transitions().len(),
            "catalog loaded"
        );
        Ok(LoadResult {
            catalog: Arc::new(catalog),
            warnings,
        })
    }
}

/// Builds a catalog from a validated file, merging the built-in catalog
/// underneath when requested.
fn build_catalog(config: CatalogConfig) -> Result<Catalog, CatalogError> {
    let file_transitions = config
        .transitions
        .into_iter()
        .map(into_definition)
        .collect::<Result<Vec<_>, _>>()?;

    let (mut emotions, mut transitions) = if config.builtin {
        (builtin::emotions(), builtin::transitions()?)
    } else {
        (Vec::new(), Vec::new())
    };

    // File entries take precedence over built-in ones
    emotions.extend(config.emotions);
    transitions.retain(|b| file_transitions.iter().all(|f| f.id() != b.id()));
    let mut merged = file_transitions;
    merged.extend(transitions);

    Catalog::new(emotions, merged, config.custom.unwrap_or_default())
}

fn into_definition(t: TransitionConfig) -> Result<TransitionDefinition, CatalogError> {
    let id = t.effective_id();
    let name = t.name.unwrap_or_else(|| id.clone());
    TransitionDefinition::new(id, name, t.description, t.from, t.to, t.phases)
}

// ============================================================================
// Variable Expansion
// ============================================================================

/// What to do when a referenced variable is unset.
enum Fallback<'a> {
    /// `${VAR}`: expand to nothing and warn
    Empty,
    /// `${VAR:-default}`
    Default(&'a str),
    /// `${VAR:?message}`
    Required(&'a str),
}

/// Splits the body of a `${...}` reference into name and fallback.
fn split_reference(body: &str) -> (&str, Fallback<'_>) {
    let Some(colon) = body.find(':') else {
        return (body, Fallback::Empty);
    };
    let (name, tail) = body.split_at(colon);
    if let Some(default) = tail.strip_prefix(":-") {
        (name, Fallback::Default(default))
    } else if let Some(message) = tail.strip_prefix(":?") {
        (name, Fallback::Required(message))
    } else {
        (body, Fallback::Empty)
    }
}

/// 1-based line of byte `offset` in `text`.
fn line_at(text: &str, offset: usize) -> usize {
    text.as_bytes()
        .iter()
        .take(offset)
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// Expands variable references in raw catalog text before it is parsed.
///
/// Lets a catalog pull phase durations, names, or templates from the
/// environment, e.g. `duration: ${CALM_INTRO:-90s}`. Supports `${VAR}`,
/// `${VAR:-default}`, `${VAR:?message}`, and `$$` for a literal `$`.
/// Defaults cannot contain `}`.
fn expand_vars(
    raw: &str,
    source_path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(String, Vec<LoadWarning>), ConfigError> {
    let mut out = String::with_capacity(raw.len());
    let mut warnings = Vec::new();
    let mut rest = raw;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }
        let Some(body_and_tail) = after.strip_prefix('{') else {
            out.push('$');
            rest = after;
            continue;
        };

        let line = line_at(raw, raw.len() - rest.len() + pos);
        let Some(end) = body_and_tail.find('}') else {
            return Err(ConfigError::ParseError {
                path: source_path.to_path_buf(),
                line: Some(line),
                message: "Unclosed variable reference '${'".to_string(),
            });
        };
        let (name, fallback) = split_reference(&body_and_tail[..end]);
        rest = &body_and_tail[end + 1..];

        if name.is_empty() {
            return Err(ConfigError::ParseError {
                path: source_path.to_path_buf(),
                line: Some(line),
                message: "Variable reference has no name".to_string(),
            });
        }

        match (lookup(name), fallback) {
            (Some(value), _) => out.push_str(&value),
            (None, Fallback::Default(default)) => out.push_str(default),
            (None, Fallback::Required(message)) => {
                return Err(ConfigError::EnvVarNotSet {
                    var: name.to_string(),
                    location: message.to_string(),
                });
            }
            (None, Fallback::Empty) => warnings.push(LoadWarning {
                message: format!("Variable '{name}' is not set, expanded to nothing"),
                location: Some(format!("{}:{line}", source_path.display())),
            }),
        }
    }
    out.push_str(rest);

    Ok((out, warnings))
}

/// Reads an environment variable and parses it, falling back to `default`
/// when unset or unparsable.
pub(crate) fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> CatalogLimits {
        CatalogLimits {
            max_transitions: 100,
            max_phases: 10,
            max_catalog_size: 64 * 1024,
        }
    }

    fn no_vars(_: &str) -> Option<String> {
        None
    }

    fn expand(raw: &str, lookup: impl Fn(&str) -> Option<String>) -> (String, Vec<LoadWarning>) {
        expand_vars(raw, Path::new("catalog.yaml"), lookup).unwrap()
    }

    #[test]
    fn test_expand_phase_duration_from_lookup() {
        let raw = "- { name: Notice, duration: ${CALM_INTRO:-30s} }";
        let (text, warnings) = expand(raw, |name| {
            (name == "CALM_INTRO").then(|| "90s".to_string())
        });
        assert_eq!(text, "- { name: Notice, duration: 90s }");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_expand_phase_duration_default() {
        let (text, _) = expand("duration: ${CALM_INTRO:-5m}", no_vars);
        assert_eq!(text, "duration: 5m");
    }

    #[test]
    fn test_expand_required_emotion_missing() {
        let err = expand_vars(
            "from: ${FROM_EMOTION:?pick a starting emotion}",
            Path::new("catalog.yaml"),
            no_vars,
        )
        .unwrap_err();
        match err {
            ConfigError::EnvVarNotSet { var, location } => {
                assert_eq!(var, "FROM_EMOTION");
                assert_eq!(location, "pick a starting emotion");
            }
            other => panic!("expected EnvVarNotSet, got {other:?}"),
        }
    }

    #[test]
    fn test_expand_dollar_in_description() {
        let (text, _) = expand("description: a $$0 ritual, $ free", no_vars);
        assert_eq!(text, "description: a $0 ritual, $ free");
    }

    #[test]
    fn test_expand_unset_name_warns_with_line() {
        let raw = "emotions:\n  - { id: ease, name: '${EASE_LABEL}' }";
        let (text, warnings) = expand(raw, no_vars);
        assert_eq!(text, "emotions:\n  - { id: ease, name: '' }");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("EASE_LABEL"));
        assert_eq!(warnings[0].location.as_deref(), Some("catalog.yaml:2"));
    }

    #[test]
    fn test_expand_unclosed_reports_line() {
        let err = expand_vars(
            "transitions:\n  - from: ${FROM",
            Path::new("catalog.yaml"),
            no_vars,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { line: Some(2), .. }));
    }

    #[test]
    fn test_expand_empty_name_rejected() {
        assert!(matches!(
            expand_vars("duration: ${:-5}", Path::new("catalog.yaml"), no_vars),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_load_str_with_default_duration() {
        let yaml = "\u{feff}emotions:
  - { id: worry, name: Worry, intensity: 0.7, group: negative }
  - { id: ease, name: Ease, intensity: 0.3, group: positive }
transitions:
  - from: worry
    to: ease
    phases:
      - { name: Notice, duration: '${MOODHARMONY_TEST_UNSET_PHASE_XYZ:-5m}' }
      - { name: Settle, duration: 1m }
";
        let result = CatalogLoader::new(limits())
            .load_str(yaml, Path::new("inline.yaml"))
            .unwrap();
        let def = result.catalog.transition("worry-to-ease").unwrap();
        assert_eq!(def.total_duration(), 360);
        assert_eq!(def.name(), "worry-to-ease");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_load_str_empty_file() {
        let err = CatalogLoader::new(limits())
            .load_str("", Path::new("empty.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_load_str_validation_error() {
        let yaml = "emotions:
  - { id: worry, name: Worry, intensity: 0.7, group: negative }
transitions:
  - { from: worry, to: nowhere, phases: [] }
";
        let err = CatalogLoader::new(limits())
            .load_str(yaml, Path::new("bad.yaml"))
            .unwrap_err();
        match err {
            ConfigError::ValidationError { errors, .. } => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_str_rejects_overflowing_phase_total() {
        let yaml = "emotions:
  - { id: worry, name: Worry, intensity: 0.7, group: negative }
  - { id: ease, name: Ease, intensity: 0.3, group: positive }
transitions:
  - from: worry
    to: ease
    phases:
      - { name: Endless, duration: 18446744073709551615 }
      - { name: Settle, duration: 2 }
";
        let err = CatalogLoader::new(limits())
            .load_str(yaml, Path::new("huge.yaml"))
            .unwrap_err();
        match err {
            ConfigError::ValidationError { errors, .. } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].path, "transitions[0].phases");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_builtin_merge_overrides_by_id() {
        let yaml = "builtin: true
transitions:
  - id: anxiety-to-calm
    name: Short breath
    from: anxiety
    to: calm
    phases:
      - { name: Breathe, duration: 10 }
";
        let result = CatalogLoader::new(limits())
            .load_str(yaml, Path::new("merge.yaml"))
            .unwrap();
        let catalog = &result.catalog;
        assert_eq!(catalog.emotions().count(), 8);
        assert_eq!(catalog.transitions().len(), 4);
        let def = catalog.find_transition("anxiety", "calm").unwrap();
        assert_eq!(def.name(), "Short breath");
        assert_eq!(def.total_duration(), 10);
    }

    #[test]
    fn test_load_missing_file() {
        let err = CatalogLoader::new(limits())
            .load(Path::new("/nonexistent/moodharmony/catalog.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn test_load_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.yaml");
        std::fs::write(&path, "#".repeat(2048)).unwrap();
        let loader = CatalogLoader::new(CatalogLimits {
            max_catalog_size: 1024,
            ..limits()
        });
        assert!(matches!(
            loader.load(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_env_or_fallback() {
        assert_eq!(env_or("MOODHARMONY_TEST_ENV_OR_XYZ", 7usize), 7);
    }
}
