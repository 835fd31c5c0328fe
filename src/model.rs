//! Quiz data types.
//!
//! Two families of types share the same JSON shape:
//!
//! * `Generated*`: what the model returns: no ids, nothing persisted yet.
//!   These derive [`JsonSchema`]; the schema is what the model is told to
//!   follow and what its answer is validated against.
//! * [`Quiz`], [`Question`], [`Answer`], [`QuizSubmission`]: stored rows with
//!   their generated ids, as returned by the HTTP API.

use chrono::{DateTime, Utc};
use quiz_session::{SessionAnswer, SessionQuestion};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A quiz as produced by the language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuiz {
    /// Short title for the quiz.
    pub name: String,
    /// One-sentence summary of what the quiz covers.
    pub description: String,
    /// Questions in display order.
    pub questions: Vec<GeneratedQuestion>,
}

/// A generated question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    /// The question shown to the user.
    pub question_text: String,
    /// Four answers, exactly one of them correct.
    pub answers: Vec<GeneratedAnswer>,
}

/// A generated answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAnswer {
    pub answer_text: String,
    pub is_correct: bool,
}

impl GeneratedQuiz {
    pub fn answer_count(&self) -> usize {
        self.questions.iter().map(|q| q.answers.len()).sum()
    }
}

impl GeneratedQuestion {
    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }
}

/// A stored quiz with its questions and answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub question_text: String,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub answer_text: String,
    pub is_correct: bool,
}

/// Listing entry for a stored quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub question_count: i64,
    pub created_at: DateTime<Utc>,
}

/// One completed attempt. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    pub id: i64,
    pub quiz_id: i64,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    /// Questions in the shape the quiz-taking state machine consumes.
    pub fn session_questions(&self) -> Vec<SessionQuestion> {
        self.questions
            .iter()
            .map(|q| SessionQuestion {
                id: q.id,
                question_text: q.question_text.clone(),
                answers: q
                    .answers
                    .iter()
                    .map(|a| SessionAnswer {
                        id: a.id,
                        answer_text: a.answer_text.clone(),
                        is_correct: a.is_correct,
                    })
                    .collect(),
            })
            .collect()
    }
}
