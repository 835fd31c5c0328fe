//! Prompts for quiz generation.
//!
//! Every prompt lives here so tests can inspect them without calling a
//! model, and so the wording changes in exactly one place.
//!
//! A request is made of two messages:
//!
//! 1. a **system** message from [`system_prompt`] that asks for a call to
//!    [`SUBMIT_QUIZ_TOOL`] and declares the JSON schema for providers that
//!    cannot call functions;
//! 2. a **user** message from [`build_prompt`]: [`QUIZ_INSTRUCTIONS`], a
//!    newline, then the document text truncated to the character budget.

use crate::pipeline::extract::TextFragment;

/// Fixed instruction placed ahead of the document text.
pub const QUIZ_INSTRUCTIONS: &str = "Given the text which is a summary of the document, \
generate a quiz based on the text. Return json only that contains a quiz object with \
fields: name, description, and questions. The questions should be an array of objects \
with fields: questionText, answers. The answers should be an array of exactly 4 objects \
with fields: answerText, isCorrect. Exactly one answer per question has isCorrect set to true.";

/// Build the user prompt from extracted fragments.
///
/// Fragments are joined with `"\n"` and the result is cut to `budget`
/// characters before [`QUIZ_INSTRUCTIONS`] is prepended. The instruction
/// prefix does not count against the budget.
pub fn build_prompt(fragments: &[TextFragment], budget: usize) -> String {
    let joined = fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let body = truncate_chars(&joined, budget);
    format!("{QUIZ_INSTRUCTIONS}\n{body}")
}

/// Return at most `max_chars` characters of `text`.
///
/// Counts `char`s, not bytes, so a multi-byte code point is never split.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Name of the function the model calls to hand back its quiz.
pub const SUBMIT_QUIZ_TOOL: &str = "submit_quiz";

/// Description attached to the [`SUBMIT_QUIZ_TOOL`] definition.
pub const SUBMIT_QUIZ_DESCRIPTION: &str =
    "Submit the finished multiple-choice quiz generated from the document.";

/// System message declaring the response schema.
///
/// `schema` is the pretty-printed JSON Schema of [`crate::model::GeneratedQuiz`].
pub fn system_prompt(schema: &str) -> String {
    format!(
        "You write multiple-choice quizzes about documents.\n\
         Hand in the quiz by calling the `{SUBMIT_QUIZ_TOOL}` function.\n\
         If no function is available, respond with a single JSON object and nothing else: \
         no prose, no markdown fences.\n\
         Either way the quiz MUST validate against this JSON Schema:\n\n{schema}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(page_num: usize, text: &str) -> TextFragment {
        TextFragment {
            page_num,
            text: text.to_string(),
        }
    }

    #[test]
    fn prompt_starts_with_instructions_then_newline() {
        let p = build_prompt(&[frag(1, "The sky is blue.")], 2000);
        assert!(p.starts_with(QUIZ_INSTRUCTIONS));
        assert_eq!(&p[QUIZ_INSTRUCTIONS.len()..], "\nThe sky is blue.");
    }

    #[test]
    fn fragments_are_joined_with_newline() {
        let p = build_prompt(&[frag(1, "one"), frag(2, "two")], 2000);
        assert!(p.ends_with("\none\ntwo"));
    }

    #[test]
    fn body_never_exceeds_budget() {
        let long = "abcdefghij".repeat(500);
        let fragments: Vec<_> = (1..=7).map(|i| frag(i, &long)).collect();
        for budget in [0, 1, 17, 2000] {
            let p = build_prompt(&fragments, budget);
            let body = &p[QUIZ_INSTRUCTIONS.len() + 1..];
            assert!(body.chars().count() <= budget, "budget {budget}");
        }
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let text = "éééé";
        assert_eq!(truncate_chars(text, 2), "éé");
        assert_eq!(truncate_chars(text, 10), text);
    }

    #[test]
    fn system_prompt_embeds_schema() {
        let s = system_prompt(r#"{"type":"object"}"#);
        assert!(s.contains(r#"{"type":"object"}"#));
        assert!(s.contains("JSON Schema"));
        assert!(s.contains(SUBMIT_QUIZ_TOOL));
    }
}
