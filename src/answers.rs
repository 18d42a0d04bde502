//! The teacher's answers collected by the question form.

use serde::{Deserialize, Deserializer, Serialize};

/// Five lesson parameters supplied alongside the PDF text.
///
/// Every field is kept as text. Form inputs arrive as strings, but API
/// clients sometimes send numbers for `size` and `time`; both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    /// Grade level, e.g. "5th grade".
    #[serde(deserialize_with = "string_or_number")]
    pub grade: String,

    /// Student group size.
    #[serde(deserialize_with = "string_or_number")]
    pub size: String,

    /// Difficulty level.
    #[serde(deserialize_with = "string_or_number")]
    pub difficulty: String,

    /// Lesson duration in minutes.
    #[serde(deserialize_with = "string_or_number")]
    pub time: String,

    /// Desired learning outcome.
    #[serde(deserialize_with = "string_or_number")]
    pub outcome: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}
