//! Catalog file schema
//!
//! Typed representation of a YAML catalog file. Values are checked by the
//! [`Validator`](super::Validator) before a [`Catalog`](crate::catalog::Catalog)
//! is built from them.
//!
//! ```yaml
//! builtin: true
//! emotions:
//!   - id: focus
//!     name: Focus
//!     intensity: 0.6
//!     group: positive
//! transitions:
//!   - from: lethargy
//!     to: focus
//!     duration: 3m
//!     phases:
//!       - { name: Recognition, duration: 30s }
//!       - { name: Activation, duration: 2m }
//!       - { name: Integration, duration: 30 }
//! custom:
//!   phases:
//!     - { name: Recognition, duration: 10 }
//!     - { name: Transition, duration: 20 }
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::custom::CustomTransitionPolicy;
use crate::catalog::transition::deserialize_optional_ticks;
use crate::catalog::{Emotion, Phase};
use crate::phase::checked_total_duration;

/// Root of a catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Seed the catalog with the built-in emotions and transitions.
    ///
    /// Entries in this file replace built-in entries with the same id.
    #[serde(default)]
    pub builtin: bool,

    /// Emotion reference table
    #[serde(default)]
    pub emotions: Vec<Emotion>,

    /// Predefined transitions
    #[serde(default)]
    pub transitions: Vec<TransitionConfig>,

    /// Policy for synthesized transitions; defaults apply when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomTransitionPolicy>,
}

/// A predefined transition as written in a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionConfig {
    /// Transition id; defaults to `"{from}-to-{to}"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name; defaults to the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Source emotion id
    pub from: String,

    /// Target emotion id
    pub to: String,

    /// Declared total duration. Informational: the phase durations are
    /// authoritative and a mismatch is reported as a warning.
    #[serde(
        default,
        deserialize_with = "deserialize_optional_ticks",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<u64>,

    /// Ordered phases
    pub phases: Vec<Phase>,
}

impl TransitionConfig {
    /// Returns the effective transition id.
    #[must_use]
    pub fn effective_id(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| CustomTransitionPolicy::transition_id(&self.from, &self.to))
    }

    /// Returns the sum of the phase durations, or `None` if it overflows.
    #[must_use]
    pub fn phase_total(&self) -> Option<u64> {
        checked_total_duration(&self.phases)
    }
}
