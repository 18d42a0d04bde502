//! Deterministic lesson plan template served when generation is unavailable.
//!
//! [`fallback_lesson_plan`] is total: any answer values, including a
//! non-numeric duration, produce a plan. Section lengths are fixed shares of
//! the duration floored to whole minutes, so their sum never exceeds it.

use crate::answers::AnswerSet;

/// Characters of PDF text quoted in the summary section.
pub const EXCERPT_CHARS: usize = 500;

/// Appended to the excerpt when the PDF text was cut.
pub const EXCERPT_MARKER: &str = "...";

/// Share of the lesson given to the main activity, in percent.
pub const MAIN_ACTIVITY_PCT: u32 = 60;
/// Share of the lesson given to assessment, in percent.
pub const ASSESSMENT_PCT: u32 = 20;
/// Share of the lesson given to the conclusion, in percent.
pub const CONCLUSION_PCT: u32 = 10;

/// Render the template plan for the given text and answers.
pub fn fallback_lesson_plan(pdf_text: &str, answers: &AnswerSet) -> String {
    let AnswerSet {
        grade,
        size,
        difficulty,
        time,
        outcome,
    } = answers;

    let main = format_minutes(section_minutes(time, MAIN_ACTIVITY_PCT));
    let assessment = format_minutes(section_minutes(time, ASSESSMENT_PCT));
    let conclusion = format_minutes(section_minutes(time, CONCLUSION_PCT));
    let summary = pdf_excerpt(pdf_text);

    format!(
        "# Lesson Plan

## Grade Level: {grade}
## Class Size: {size} students
## Difficulty Level: {difficulty}
## Duration: {time} minutes

## Learning Objective
{outcome}

## Materials Needed
- PDF content (provided)
- Writing materials
- Additional resources as needed

## Lesson Structure

### 1. Introduction (5-10 minutes)
- Review the PDF content
- Set learning expectations
- Engage students with key concepts

### 2. Main Activity ({main} minutes)
- Work through the PDF content
- Apply concepts through activities
- Group work or individual practice

### 3. Assessment ({assessment} minutes)
- Check for understanding
- Provide feedback
- Address any questions

### 4. Conclusion ({conclusion} minutes)
- Summarize key points
- Connect to learning objective
- Preview next steps

## Notes
This lesson plan was generated automatically. Please review and modify as needed for your specific classroom context.

## PDF Content Summary
{summary}"
    )
}

/// First [`EXCERPT_CHARS`] characters of the text, marked when truncated.
pub fn pdf_excerpt(pdf_text: &str) -> String {
    match pdf_text.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}{EXCERPT_MARKER}", &pdf_text[..cut]),
        None => pdf_text.to_string(),
    }
}

/// `floor(duration * pct / 100)`; `NaN` when the duration is not a number.
pub fn section_minutes(duration: &str, pct: u32) -> f64 {
    let minutes = parse_duration(duration);
    (minutes * f64::from(pct) / 100.0).floor()
}

/// Lenient number parsing: surrounding whitespace is ignored and an empty
/// value counts as zero.
fn parse_duration(duration: &str) -> f64 {
    let trimmed = duration.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => f64::NAN,
    }
}

fn format_minutes(minutes: f64) -> String {
    if minutes.is_nan() {
        "NaN".to_string()
    } else if minutes == 0.0 {
        // avoid "-0" for small negative durations
        "0".to_string()
    } else {
        format!("{minutes}")
    }
}
