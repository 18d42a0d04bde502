//! Prompt text sent to the generation API.
//!
//! Every prompt lives here so tests can inspect it without a live model.

use crate::answers::AnswerSet;

/// Fixed instruction that opens every generation prompt.
pub const LESSON_PLAN_INSTRUCTION: &str =
    "Create a lesson plan based on the following PDF content and teacher's answers.";

/// Build the single prompt string for one generate request.
///
/// The answers are embedded as pretty-printed JSON; the model reads free
/// text, so field order and exact formatting carry no meaning.
pub fn build_lesson_prompt(pdf_text: &str, answers: &AnswerSet) -> String {
    let answers_json =
        serde_json::to_string_pretty(answers).unwrap_or_else(|_| format!("{answers:?}"));
    format!(
        "{LESSON_PLAN_INSTRUCTION}\n\nPDF Content:\n{pdf_text}\n\nTeacher's Answers:\n{answers_json}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers() -> AnswerSet {
        AnswerSet {
            grade: "7".into(),
            size: "20".into(),
            difficulty: "hard".into(),
            time: "50".into(),
            outcome: "Explain photosynthesis".into(),
        }
    }

    #[test]
    fn prompt_contains_all_parts_in_order() {
        let prompt = build_lesson_prompt("Chlorophyll absorbs light.", &answers());
        let instr = prompt.find(LESSON_PLAN_INSTRUCTION).unwrap();
        let pdf = prompt.find("Chlorophyll absorbs light.").unwrap();
        let ans = prompt.find("\"outcome\": \"Explain photosynthesis\"").unwrap();
        assert!(instr < pdf && pdf < ans, "got: {prompt}");
    }

    #[test]
    fn empty_pdf_text_still_builds() {
        let prompt = build_lesson_prompt("", &answers());
        assert!(prompt.contains("PDF Content:\n\n\nTeacher's Answers:"));
    }
}
