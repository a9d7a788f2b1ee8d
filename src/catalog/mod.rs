//! Transition catalog
//!
//! Holds the emotion reference table and the predefined transitions, and
//! resolves a `(from, to)` pair into a [`TransitionDefinition`]: the
//! predefined one when it exists, otherwise one synthesized from the
//! [`CustomTransitionPolicy`].

pub mod builtin;
pub mod custom;
pub mod emotion;
pub mod transition;

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::CatalogError;

pub use custom::CustomTransitionPolicy;
pub use emotion::{Emotion, EmotionGroup};
pub use transition::{Phase, TransitionDefinition};

/// Maximum Damerau-Levenshtein distance for "did you mean" suggestions.
const SUGGESTION_DISTANCE: usize = 3;

/// Emotion table, predefined transitions, and custom-transition policy.
#[derive(Debug, Clone)]
pub struct Catalog {
    emotions: IndexMap<String, Emotion>,
    transitions: Vec<Arc<TransitionDefinition>>,
    policy: CustomTransitionPolicy,
}

impl Catalog {
    /// Creates a catalog.
    ///
    /// Later emotions with a duplicate id replace earlier ones; the config
    /// validator reports duplicates before a catalog file gets here.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownEmotion`] if a transition references an
    /// emotion that is not in `emotions`.
    pub fn new(
        emotions: Vec<Emotion>,
        transitions: Vec<TransitionDefinition>,
        policy: CustomTransitionPolicy,
    ) -> Result<Self, CatalogError> {
        let emotions: IndexMap<String, Emotion> =
            emotions.into_iter().map(|e| (e.id.clone(), e)).collect();

        let catalog = Self {
            emotions,
            transitions: Vec::new(),
            policy,
        };
        for t in &transitions {
            catalog.emotion(t.from())?;
            catalog.emotion(t.to())?;
        }

        Ok(Self {
            transitions: transitions.into_iter().map(Arc::new).collect(),
            ..catalog
        })
    }

    /// Creates the built-in catalog with the default custom policy.
    ///
    /// # Errors
    ///
    /// Propagates definition errors from the built-in data.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(
            builtin::emotions(),
            builtin::transitions()?,
            CustomTransitionPolicy::default(),
        )
    }

    /// Returns all emotions in declaration order.
    pub fn emotions(&self) -> impl Iterator<Item = &Emotion> {
        self.emotions.values()
    }

    /// Returns the emotions of one polarity group.
    pub fn emotions_in_group(&self, group: EmotionGroup) -> impl Iterator<Item = &Emotion> {
        self.emotions.values().filter(move |e| e.group == group)
    }

    /// Returns the predefined transitions in declaration order.
    #[must_use]
    pub fn transitions(&self) -> &[Arc<TransitionDefinition>] {
        &self.transitions
    }

    /// Returns the custom-transition policy.
    #[must_use]
    pub const fn policy(&self) -> &CustomTransitionPolicy {
        &self.policy
    }

    /// Looks up an emotion by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownEmotion`], with the closest known id as
    /// a suggestion when one is close enough.
    pub fn emotion(&self, id: &str) -> Result<&Emotion, CatalogError> {
        self.emotions
            .get(id)
            .ok_or_else(|| CatalogError::UnknownEmotion {
                id: id.to_string(),
                suggestion: self.suggest_emotion(id),
            })
    }

    /// Suggests a known emotion id for a mistyped one.
    #[must_use]
    pub fn suggest_emotion(&self, input: &str) -> Option<String> {
        self.emotions
            .keys()
            .map(|id| (id, strsim::damerau_levenshtein(input, id)))
            .filter(|(_, dist)| *dist <= SUGGESTION_DISTANCE)
            .min_by_key(|(_, dist)| *dist)
            .map(|(id, _)| id.clone())
    }

    /// Looks up a predefined transition by id.
    #[must_use]
    pub fn transition(&self, id: &str) -> Option<&Arc<TransitionDefinition>> {
        self.transitions.iter().find(|t| t.id() == id)
    }

    /// Finds the predefined transition for an exact `(from, to)` pair.
    #[must_use]
    pub fn find_transition(&self, from: &str, to: &str) -> Option<&Arc<TransitionDefinition>> {
        self.transitions
            .iter()
            .find(|t| t.from() == from && t.to() == to)
    }

    /// Builds an ad-hoc transition for `from → to` from the custom policy.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownEmotion`] if either id is unknown, or
    /// [`CatalogError::InvalidDefinition`] if the policy is malformed.
    pub fn synthesize_custom(
        &self,
        from: &str,
        to: &str,
    ) -> Result<TransitionDefinition, CatalogError> {
        let from = self.emotion(from)?;
        let to = self.emotion(to)?;
        self.policy.synthesize(from, to)
    }

    /// Resolves the transition for `from → to`.
    ///
    /// Returns the predefined transition when one matches, otherwise a
    /// synthesized one.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownEmotion`] if either id is unknown.
    pub fn resolve(&self, from: &str, to: &str) -> Result<Arc<TransitionDefinition>, CatalogError> {
        self.emotion(from)?;
        self.emotion(to)?;

        if let Some(found) = self.find_transition(from, to) {
            debug!(transition = found.id(), "resolved predefined transition");
            return Ok(Arc::clone(found));
        }

        let custom = self.synthesize_custom(from, to)?;
        debug!(transition = custom.id(), "synthesized custom transition");
        Ok(Arc::new(custom))
    }

    /// Resolves a transition by id, falling back to the `(from, to)` pair.
    ///
    /// Used when restoring saved progress, where the id of a synthesized
    /// transition is not in the predefined list.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownEmotion`] if the fallback pair is
    /// unknown.
    pub fn resolve_by_id(
        &self,
        id: &str,
        from: &str,
        to: &str,
    ) -> Result<Arc<TransitionDefinition>, CatalogError> {
        if let Some(found) = self.transition(id) {
            return Ok(Arc::clone(found));
        }
        let resolved = self.resolve(from, to)?;
        if resolved.id() == id {
            Ok(resolved)
        } else {
            Err(CatalogError::UnknownTransition(id.to_string()))
        }
    }

    /// Suggests a target for a source emotion when the user has not picked
    /// one: the first positive emotion other than the source.
    #[must_use]
    pub fn suggest_target(&self, from: &str) -> Option<&Emotion> {
        self.emotions_in_group(EmotionGroup::Positive)
            .find(|e| e.id != from)
    }

    /// Returns the display steps of a transition's emotional progression.
    ///
    /// The source name comes first and the target name last. The policy's
    /// intermediate steps are inserted when the transition has more than two
    /// phases. Unknown emotion ids are shown verbatim.
    #[must_use]
    pub fn emotional_progression(&self, definition: &TransitionDefinition) -> Vec<String> {
        let name_of = |id: &str| {
            self.emotions
                .get(id)
                .map_or_else(|| id.to_string(), |e| e.name.clone())
        };

        let mut steps = vec![name_of(definition.from())];
        if definition.phases().len() > 2 {
            steps.extend(self.policy.intermediate_steps.iter().cloned());
        }
        steps.push(name_of(definition.to()));
        steps
    }
}
