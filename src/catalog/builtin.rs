//! Built-in emotions and predefined transitions.

use super::emotion::{Emotion, EmotionGroup};
use super::transition::{Phase, TransitionDefinition};
use crate::error::CatalogError;

/// Returns the built-in emotion table.
#[must_use]
pub fn emotions() -> Vec<Emotion> {
    vec![
        Emotion::new(
            "joy",
            "Joy",
            "A feeling of happiness and contentment",
            0.8,
            EmotionGroup::Positive,
        )
        .with_icon("😊"),
        Emotion::new(
            "calm",
            "Calm",
            "A feeling of tranquillity and inner peace",
            0.3,
            EmotionGroup::Positive,
        )
        .with_icon("😌"),
        Emotion::new(
            "gratitude",
            "Gratitude",
            "A feeling of thankfulness and appreciation",
            0.6,
            EmotionGroup::Positive,
        )
        .with_icon("🙏"),
        Emotion::new(
            "hope",
            "Hope",
            "A feeling of optimism about the future",
            0.7,
            EmotionGroup::Positive,
        )
        .with_icon("✨"),
        Emotion::new(
            "anxiety",
            "Anxiety",
            "A feeling of worry and nervousness",
            0.7,
            EmotionGroup::Negative,
        )
        .with_icon("😰"),
        Emotion::new(
            "sadness",
            "Sadness",
            "A feeling of melancholy and sorrow",
            0.6,
            EmotionGroup::Negative,
        )
        .with_icon("😢"),
        Emotion::new(
            "anger",
            "Anger",
            "A feeling of irritation and frustration",
            0.8,
            EmotionGroup::Negative,
        )
        .with_icon("😠"),
        Emotion::new(
            "lethargy",
            "Lethargy",
            "A feeling of tiredness and lack of energy",
            0.4,
            EmotionGroup::Negative,
        )
        .with_icon("😴"),
    ]
}

/// Returns the predefined transitions.
///
/// # Errors
///
/// Never fails for the shipped data; the `Result` comes from
/// [`TransitionDefinition::new`].
pub fn transitions() -> Result<Vec<TransitionDefinition>, CatalogError> {
    Ok(vec![
        TransitionDefinition::new(
            "anxiety-to-calm",
            "From anxiety to calm",
            "A musical path to ease anxiety and find calm",
            "anxiety",
            "calm",
            vec![
                Phase::new("Recognition", 5),
                Phase::new("Stabilisation", 10),
                Phase::new("Transition", 10),
                Phase::new("Integration", 5),
            ],
        )?,
        TransitionDefinition::new(
            "lethargy-to-joy",
            "From lethargy to joy",
            "A musical path to regain energy and joy",
            "lethargy",
            "joy",
            vec![
                Phase::new("Awakening", 5),
                Phase::new("Stimulation", 8),
                Phase::new("Motivation", 7),
                Phase::new("Celebration", 5),
            ],
        )?,
        TransitionDefinition::new(
            "sadness-to-hope",
            "From sadness to hope",
            "A musical path to turn sadness into hope",
            "sadness",
            "hope",
            vec![
                Phase::new("Acceptance", 8),
                Phase::new("Healing", 10),
                Phase::new("Opening", 10),
                Phase::new("Perspective", 7),
            ],
        )?,
        TransitionDefinition::new(
            "anger-to-gratitude",
            "From anger to gratitude",
            "A musical path to soothe anger and cultivate gratitude",
            "anger",
            "gratitude",
            vec![
                Phase::new("Expression", 10),
                Phase::new("Release", 10),
                Phase::new("Soothing", 10),
                Phase::new("Appreciation", 10),
            ],
        )?,
    ])
}
