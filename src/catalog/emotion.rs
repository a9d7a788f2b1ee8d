//! Emotion reference data.

use serde::{Deserialize, Serialize};

/// Polarity group of an emotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionGroup {
    /// Pleasant states (joy, calm, ...)
    Positive,
    /// Unpleasant states (anxiety, anger, ...)
    Negative,
    /// Neither
    Neutral,
}

impl std::fmt::Display for EmotionGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        };
        f.pad(s)
    }
}

/// A named affective state.
///
/// Immutable once loaded into a [`Catalog`](super::Catalog).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emotion {
    /// Stable identifier (e.g. `"anxiety"`)
    pub id: String,
    /// Display name
    pub name: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Intensity in `[0, 1]`
    pub intensity: f64,
    /// Polarity group
    pub group: EmotionGroup,
    /// Optional display glyph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Emotion {
    /// Creates an emotion without an icon.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        intensity: f64,
        group: EmotionGroup,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            intensity,
            group,
            icon: None,
        }
    }

    /// Sets the display glyph.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Returns `true` if this emotion belongs to the positive group.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.group == EmotionGroup::Positive
    }
}
