//! Post-processing: turn the model's answer into a validated [`GeneratedQuiz`].
//!
//! Two entry points:
//!
//! * [`parse_tool_arguments`] for the arguments of a `submit_quiz` function
//!   call. These are JSON by construction, so they are parsed strictly.
//! * [`parse_quiz`] for a plain-text reply, used when the provider cannot call
//!   functions. The reply is parsed strictly first; only when that fails are
//!   fences stripped and the text scanned for an embedded object.
//!
//! Both paths check the value against the declared schema before serde ever
//! sees it, so a schema violation is reported with every failing path instead
//! of the first serde error.
//!
//! ## Rule Order
//!
//! 1. Parse the whole reply as JSON
//! 2. Failing that, strip outer ```` ``` ```` / ```` ```json ```` fences
//! 3. Failing that, scan for the first embedded object, preferring one with `questions`
//! 4. Unwrap a `{"quiz": {…}}` envelope
//! 5. Validate against the JSON Schema of [`GeneratedQuiz`]
//! 6. Deserialize
//! 7. Trim every text field
//! 8. Reject a quiz without questions
//! 9. Warn about questions that do not have exactly one correct answer

use crate::error::{GenerationError, QuizgenError};
use crate::model::GeneratedQuiz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

/// The declared quiz schema, compiled once.
pub struct QuizSchema {
    validator: jsonschema::Validator,
    value: Value,
    pretty: String,
}

impl QuizSchema {
    /// Generate the schema from [`GeneratedQuiz`] and compile a validator for it.
    pub fn new() -> Result<Self, QuizgenError> {
        let schema = serde_json::to_value(schemars::schema_for!(GeneratedQuiz))
            .map_err(|e| QuizgenError::Internal(format!("quiz schema: {e}")))?;
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| QuizgenError::Internal(format!("quiz schema does not compile: {e}")))?;
        let pretty = serde_json::to_string_pretty(&schema)
            .map_err(|e| QuizgenError::Internal(format!("quiz schema: {e}")))?;
        Ok(Self {
            validator,
            value: schema,
            pretty,
        })
    }

    /// The schema as function parameters: the root object without the
    /// `$schema` and `title` keywords, which tool definitions do not accept.
    pub fn tool_parameters(&self) -> Value {
        let mut parameters = self.value.clone();
        if let Value::Object(ref mut map) = parameters {
            map.remove("$schema");
            map.remove("title");
        }
        parameters
    }

    /// The schema as pretty-printed JSON, for the system prompt.
    pub fn as_json(&self) -> &str {
        &self.pretty
    }

    /// Every violation as `"<path>: <message>"`.
    pub fn violations(&self, instance: &Value) -> Vec<String> {
        self.validator
            .iter_errors(instance)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{path}: {e}")
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for QuizSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizSchema").finish_non_exhaustive()
    }
}

/// Parse the arguments of a `submit_quiz` function call.
pub fn parse_tool_arguments(
    arguments: &str,
    schema: &QuizSchema,
) -> Result<GeneratedQuiz, GenerationError> {
    let value: Value =
        serde_json::from_str(arguments).map_err(|e| GenerationError::MalformedOutput {
            detail: format!("function arguments are not JSON: {e}"),
        })?;
    validate(value, schema)
}

/// Parse a plain-text reply into a quiz.
pub fn parse_quiz(raw: &str, schema: &QuizSchema) -> Result<GeneratedQuiz, GenerationError> {
    let value = reply_value(raw).ok_or_else(|| GenerationError::MalformedOutput {
        detail: format!("no JSON object in response ({} chars)", raw.chars().count()),
    })?;
    validate(value, schema)
}

fn reply_value(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let unfenced = strip_json_fences(trimmed);
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&unfenced) {
        return Some(value);
    }

    warn!("Reply is not bare JSON; scanning it for an embedded object");
    find_embedded_object(&unfenced)
}

fn validate(value: Value, schema: &QuizSchema) -> Result<GeneratedQuiz, GenerationError> {
    let value = unwrap_envelope(value);

    let errors = schema.violations(&value);
    if !errors.is_empty() {
        return Err(GenerationError::SchemaViolation { errors });
    }

    let mut quiz: GeneratedQuiz =
        serde_json::from_value(value).map_err(|e| GenerationError::MalformedOutput {
            detail: e.to_string(),
        })?;
    trim_texts(&mut quiz);

    if quiz.questions.is_empty() {
        return Err(GenerationError::MalformedOutput {
            detail: "the quiz has no questions".to_string(),
        });
    }
    warn_on_integrity(&quiz);
    Ok(quiz)
}

// ── Rule 2: Strip outer fences ───────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[a-zA-Z]*[ \t]*\n(.*)\n```\s*$").expect("valid fence regex")
});

fn strip_json_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 3: Scan for an embedded object ──────────────────────────────────────

/// Try a streaming parse from every `{`, left to right. The first object that
/// looks like a quiz wins; otherwise the first object that parsed at all.
fn find_embedded_object(input: &str) -> Option<Value> {
    let mut first = None;
    for (start, _) in input.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&input[start..]).into_iter::<Value>();
        let Some(Ok(value @ Value::Object(_))) = stream.next() else {
            continue;
        };
        if looks_like_quiz(&value) {
            return Some(value);
        }
        first.get_or_insert(value);
    }
    first
}

fn looks_like_quiz(value: &Value) -> bool {
    value.get("questions").is_some()
        || value.get("quiz").is_some_and(|q| q.get("questions").is_some())
}

// ── Rule 4: Unwrap {"quiz": {...}} ───────────────────────────────────────────

fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.get("quiz").is_some_and(Value::is_object) => {
            map.remove("quiz").unwrap_or(Value::Null)
        }
        other => other,
    }
}

// ── Rule 7: Trim texts ───────────────────────────────────────────────────────

fn trim_texts(quiz: &mut GeneratedQuiz) {
    fn trim(s: &mut String) {
        let t = s.trim();
        if t.len() != s.len() {
            *s = t.to_string();
        }
    }

    trim(&mut quiz.name);
    trim(&mut quiz.description);
    for q in &mut quiz.questions {
        trim(&mut q.question_text);
        for a in &mut q.answers {
            trim(&mut a.answer_text);
        }
    }
}

// ── Rule 9: Integrity warnings ───────────────────────────────────────────────

fn warn_on_integrity(quiz: &GeneratedQuiz) {
    for (i, q) in quiz.questions.iter().enumerate() {
        let correct = q.correct_count();
        if correct != 1 {
            warn!(
                "Question {} has {} correct answers (expected 1): {:?}",
                i + 1,
                correct,
                q.question_text
            );
        }
        if q.answers.len() != 4 {
            warn!("Question {} has {} answers (expected 4)", i + 1, q.answers.len());
        }
    }
}
