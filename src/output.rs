//! Result types returned by the generation pipeline.

use serde::{Deserialize, Serialize};

/// Advisory note attached to every fallback plan.
pub const FALLBACK_NOTE: &str = "AI service was temporarily unavailable. This is a basic lesson plan template. Please customize it for your needs.";

/// Outcome of one generate request.
///
/// Serialises to the exact JSON the client expects:
/// `{"lessonPlan": …}` or `{"lessonPlan": …, "note": …, "attempts": …}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationResult {
    /// Fallback template served after generation failed.
    ///
    /// Listed first so untagged deserialisation prefers the richer shape.
    Fallback {
        #[serde(rename = "lessonPlan")]
        lesson_plan: String,
        note: String,
        /// Number of generation attempts actually made.
        attempts: u32,
    },
    /// Text produced by the model.
    Generated {
        #[serde(rename = "lessonPlan")]
        lesson_plan: String,
    },
}

impl GenerationResult {
    /// The plan text, whichever way it was produced.
    pub fn lesson_plan(&self) -> &str {
        match self {
            GenerationResult::Generated { lesson_plan }
            | GenerationResult::Fallback { lesson_plan, .. } => lesson_plan,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, GenerationResult::Fallback { .. })
    }

    /// Attempts made before falling back; `None` for generated plans.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            GenerationResult::Fallback { attempts, .. } => Some(*attempts),
            GenerationResult::Generated { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_serialises_plan_only() {
        let r = GenerationResult::Generated {
            lesson_plan: "# Plan".into(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json, serde_json::json!({"lessonPlan": "# Plan"}));
    }

    #[test]
    fn fallback_serialises_note_and_attempts() {
        let r = GenerationResult::Fallback {
            lesson_plan: "# Lesson Plan".into(),
            note: FALLBACK_NOTE.into(),
            attempts: 5,
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["attempts"], 5);
        assert_eq!(json["note"], FALLBACK_NOTE);
        assert_eq!(r.attempts(), Some(5));
        assert!(r.is_fallback());
    }
}
