//! Post-session evaluation capture.
//!
//! An [`EvaluationDraft`] is filled in field by field after a session
//! completes. [`EvaluationDraft::submit`] validates it and yields the final
//! [`EvaluationRecord`].

use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;

/// Lowest accepted effectiveness rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted effectiveness rating.
pub const MAX_RATING: u8 = 5;

/// A validated evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Emotion id the user reports feeling now
    pub current_emotion: String,
    /// Effectiveness rating, 1 to 5
    pub effectiveness: u8,
    /// Optional free-text feedback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// An evaluation being filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationDraft {
    current_emotion: Option<String>,
    effectiveness: Option<u8>,
    feedback: Option<String>,
}

impl EvaluationDraft {
    /// Creates an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the emotion the user reports feeling now.
    pub fn record_current_emotion(&mut self, emotion_id: impl Into<String>) {
        self.current_emotion = Some(emotion_id.into());
    }

    /// Records the effectiveness rating.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::InvalidRating`] if `rating` is outside
    /// 1..=5; the previous rating is kept.
    pub fn record_effectiveness(&mut self, rating: u8) -> Result<(), EvaluationError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(EvaluationError::InvalidRating(rating));
        }
        self.effectiveness = Some(rating);
        Ok(())
    }

    /// Records free-text feedback. Blank text clears it.
    pub fn record_feedback(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.feedback = if text.trim().is_empty() {
            None
        } else {
            Some(text)
        };
    }

    /// Returns the recorded emotion id, if any.
    #[must_use]
    pub fn current_emotion(&self) -> Option<&str> {
        self.current_emotion.as_deref()
    }

    /// Returns the recorded rating, if any.
    #[must_use]
    pub const fn effectiveness(&self) -> Option<u8> {
        self.effectiveness
    }

    /// Returns the recorded feedback, if any.
    #[must_use]
    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    /// Returns the names of required fields not yet recorded.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.current_emotion.is_none() {
            missing.push("current emotion");
        }
        if self.effectiveness.is_none() {
            missing.push("effectiveness");
        }
        missing
    }

    /// Validates the draft and returns the finished record, leaving the
    /// draft empty.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::IncompleteEvaluation`] naming the missing
    /// fields; the draft is left untouched so the user can fill them in.
    pub fn submit(&mut self) -> Result<EvaluationRecord, EvaluationError> {
        let (Some(current_emotion), Some(effectiveness)) =
            (self.current_emotion.clone(), self.effectiveness)
        else {
            return Err(EvaluationError::IncompleteEvaluation {
                missing: self.missing_fields(),
            });
        };

        let record = EvaluationRecord {
            current_emotion,
            effectiveness,
            feedback: self.feedback.take(),
        };
        *self = Self::default();
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_without_effectiveness_fails_then_succeeds() {
        let mut draft = EvaluationDraft::new();
        draft.record_current_emotion("calm");
        assert_eq!(
            draft.submit(),
            Err(EvaluationError::IncompleteEvaluation {
                missing: vec!["effectiveness"]
            })
        );

        draft.record_effectiveness(4).unwrap();
        draft.record_current_emotion("hope");
        let record = draft.submit().unwrap();
        assert_eq!(record.current_emotion, "hope");
        assert_eq!(record.effectiveness, 4);
        assert_eq!(draft, EvaluationDraft::default());
    }

    #[test]
    fn test_empty_draft_reports_both_missing() {
        let mut draft = EvaluationDraft::new();
        let err = draft.submit().unwrap_err();
        assert_eq!(
            err,
            EvaluationError::IncompleteEvaluation {
                missing: vec!["current emotion", "effectiveness"]
            }
        );
    }

    #[test]
    fn test_rating_bounds() {
        let mut draft = EvaluationDraft::new();
        assert_eq!(
            draft.record_effectiveness(0),
            Err(EvaluationError::InvalidRating(0))
        );
        assert_eq!(
            draft.record_effectiveness(6),
            Err(EvaluationError::InvalidRating(6))
        );
        draft.record_effectiveness(1).unwrap();
        draft.record_effectiveness(5).unwrap();
        assert_eq!(draft.effectiveness(), Some(5));
        assert!(draft.record_effectiveness(9).is_err());
        assert_eq!(draft.effectiveness(), Some(5));
    }

    #[test]
    fn test_feedback_is_optional_and_blank_clears() {
        let mut draft = EvaluationDraft::new();
        draft.record_current_emotion("calm");
        draft.record_effectiveness(3).unwrap();
        draft.record_feedback("felt lighter");
        assert_eq!(draft.feedback(), Some("felt lighter"));
        draft.record_feedback("   ");
        assert_eq!(draft.feedback(), None);
        assert!(draft.submit().unwrap().feedback.is_none());
    }
}
