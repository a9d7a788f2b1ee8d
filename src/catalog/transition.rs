//! Transition definitions and their phases.
//!
//! Durations are expressed in ticks. One tick is one second of session
//! time; the tick source may pace ticks differently in wall-clock terms.

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::phase::{checked_total_duration, total_duration};

/// A named sub-interval of a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    /// Display name
    pub name: String,
    /// Length in ticks, always > 0 inside a validated definition.
    ///
    /// Accepts an integer tick count or a humantime string (`"5m"`,
    /// `"90s"`) when deserialized.
    #[serde(deserialize_with = "deserialize_ticks")]
    pub duration: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TicksRepr {
    Count(u64),
    Text(String),
}

/// Deserializes a duration given either as whole ticks or as a humantime
/// string. Sub-second remainders are rejected.
fn deserialize_ticks<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match TicksRepr::deserialize(deserializer)? {
        TicksRepr::Count(n) => Ok(n),
        TicksRepr::Text(s) => parse_ticks(&s).map_err(serde::de::Error::custom),
    }
}

/// Optional form of [`deserialize_ticks`], for use with `#[serde(default)]`.
pub(crate) fn deserialize_optional_ticks<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<TicksRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(TicksRepr::Count(n)) => Ok(Some(n)),
        Some(TicksRepr::Text(s)) => parse_ticks(&s).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Parses a humantime duration string into whole ticks (seconds).
///
/// # Errors
///
/// Returns a message if the string is not a valid duration or is not a
/// whole number of seconds.
pub fn parse_ticks(s: &str) -> Result<u64, String> {
    let trimmed = s.trim();
    if let Ok(n) = trimmed.parse::<u64>() {
        return Ok(n);
    }
    let duration =
        humantime::parse_duration(trimmed).map_err(|e| format!("invalid duration '{s}': {e}"))?;
    if duration.subsec_nanos() != 0 {
        return Err(format!("duration '{s}' is not a whole number of seconds"));
    }
    Ok(duration.as_secs())
}

impl Phase {
    /// Creates a phase.
    #[must_use]
    pub fn new(name: impl Into<String>, duration: u64) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }
}

/// A guided, timed sequence of phases from one emotion toward another.
///
/// Constructed through [`TransitionDefinition::new`], which rejects empty
/// phase lists and zero-length phases. The total duration is always derived
/// from the phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionDefinition {
    id: String,
    name: String,
    description: String,
    from: String,
    to: String,
    phases: Vec<Phase>,
}

impl TransitionDefinition {
    /// Creates a validated definition.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidDefinition`] if `phases` is empty or
    /// any phase has a zero duration.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        phases: Vec<Phase>,
    ) -> Result<Self, CatalogError> {
        let id = id.into();
        if phases.is_empty() {
            return Err(CatalogError::InvalidDefinition {
                id,
                reason: "a transition needs at least one phase".to_string(),
            });
        }
        if let Some(phase) = phases.iter().find(|p| p.duration == 0) {
            return Err(CatalogError::InvalidDefinition {
                reason: format!("phase '{}' has zero duration", phase.name),
                id,
            });
        }
        if checked_total_duration(&phases).is_none() {
            return Err(CatalogError::InvalidDefinition {
                id,
                reason: "total phase duration overflows".to_string(),
            });
        }
        Ok(Self {
            id,
            name: name.into(),
            description: description.into(),
            from: from.into(),
            to: to.into(),
            phases,
        })
    }

    /// Returns the transition id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the source emotion id.
    #[must_use]
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Returns the target emotion id.
    #[must_use]
    pub fn to(&self) -> &str {
        &self.to
    }

    /// Returns the ordered phases (never empty).
    #[must_use]
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Returns the phase at `index`, if any.
    #[must_use]
    pub fn phase(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    /// Returns the index of the last phase.
    #[must_use]
    pub const fn last_phase_index(&self) -> usize {
        self.phases.len().saturating_sub(1)
    }

    /// Returns the total duration in ticks (sum of phase durations).
    #[must_use]
    pub fn total_duration(&self) -> u64 {
        total_duration(&self.phases)
    }
}
