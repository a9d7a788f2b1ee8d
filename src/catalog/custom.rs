//! Naming and timing policy for ad-hoc transitions.
//!
//! When no predefined transition matches a chosen `(from, to)` pair, the
//! catalog synthesizes one from a [`CustomTransitionPolicy`]. The policy is
//! plain data so it can be overridden from the catalog file.

use serde::{Deserialize, Serialize};

use super::emotion::Emotion;
use super::transition::{Phase, TransitionDefinition};
use crate::error::CatalogError;

/// Placeholder replaced by the source emotion's display name.
const FROM_PLACEHOLDER: &str = "{from}";
/// Placeholder replaced by the target emotion's display name.
const TO_PLACEHOLDER: &str = "{to}";

/// Policy used to build synthesized transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomTransitionPolicy {
    /// Phases of every synthesized transition, in order
    pub phases: Vec<Phase>,
    /// Display name template (`{from}` / `{to}` placeholders)
    pub name_template: String,
    /// Description template (`{from}` / `{to}` placeholders)
    pub description_template: String,
    /// Display steps shown between source and target when a transition has
    /// more than two phases
    pub intermediate_steps: Vec<String>,
}

impl Default for CustomTransitionPolicy {
    fn default() -> Self {
        Self {
            phases: vec![
                Phase::new("Recognition", 7),
                Phase::new("Transition", 16),
                Phase::new("Integration", 7),
            ],
            name_template: "From {from} to {to}".to_string(),
            description_template: "Custom transition from {from} to {to}".to_string(),
            intermediate_steps: vec!["Melancholy".to_string(), "Serenity".to_string()],
        }
    }
}

impl CustomTransitionPolicy {
    /// Returns the id a synthesized transition between two emotions gets.
    #[must_use]
    pub fn transition_id(from_id: &str, to_id: &str) -> String {
        format!("{from_id}-to-{to_id}")
    }

    /// Builds the transition for `from → to`.
    ///
    /// Pure: the same inputs always yield an equal definition.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidDefinition`] if the policy's phases are
    /// empty or contain a zero duration.
    pub fn synthesize(
        &self,
        from: &Emotion,
        to: &Emotion,
    ) -> Result<TransitionDefinition, CatalogError> {
        TransitionDefinition::new(
            Self::transition_id(&from.id, &to.id),
            render(&self.name_template, from, to),
            render(&self.description_template, from, to),
            from.id.clone(),
            to.id.clone(),
            self.phases.clone(),
        )
    }
}

fn render(template: &str, from: &Emotion, to: &Emotion) -> String {
    template
        .replace(FROM_PLACEHOLDER, &from.name)
        .replace(TO_PLACEHOLDER, &to.name)
}
