//! # quiz-session
//!
//! The quiz-taking state machine behind the pdfquiz front-end, kept free of
//! any I/O so it can run in a browser (WASM), a terminal, or a test.
//!
//! ```text
//!               start                 next (last question)
//! NotStarted ─────────▶ InProgress(0) ─ … ─────────────────▶ Submitted
//!                        │   ▲  │  ▲
//!                  answer│   │  │  │prev / next
//!                        ▼   │  ▼  │
//!                       InProgress(i)
//!
//! exit: any state ──▶ Exited
//! ```
//!
//! The caller owns every side effect: when [`QuizSession::next`] reports
//! [`Step::Submitted`], it persists the returned [`Outcome`] and drops any
//! cached copy of the quiz. The session itself is `Serialize`/`Deserialize`
//! so it can be stashed between screens. A cached session is checked as it is
//! read back: one that no longer fits its own questions fails to deserialize
//! with [`SessionError::InvalidCache`].
//!
//! ## Scoring
//!
//! One answer is accepted per question. A second answer for the same question
//! is rejected with [`SessionError::AlreadyAnswered`], which keeps
//! `score ≤ total` and makes the final score equal to the number of questions
//! answered correctly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of an answer, as handed out by the persistence layer.
pub type AnswerId = i64;

/// One selectable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAnswer {
    pub id: AnswerId,
    pub answer_text: String,
    pub is_correct: bool,
}

/// One question with its answers, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuestion {
    pub id: i64,
    pub question_text: String,
    pub answers: Vec<SessionAnswer>,
}

impl SessionQuestion {
    /// Text of the first answer flagged correct, if any.
    pub fn correct_answer(&self) -> Option<&str> {
        self.answers
            .iter()
            .find(|a| a.is_correct)
            .map(|a| a.answer_text.as_str())
    }
}

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum SessionState {
    NotStarted,
    InProgress { index: usize },
    Submitted,
    /// The user left the flow (home / new quiz). Nothing is persisted.
    Exited,
}

/// Final result of a completed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub score: usize,
    pub total_questions: usize,
    pub score_percentage: u32,
}

/// Result of a successful `next` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Moved to the question at this index.
    Question(usize),
    /// The last question was left; the attempt is over.
    Submitted(Outcome),
}

/// Feedback for the answer recorded on the current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum Feedback {
    Correct,
    Incorrect {
        #[serde(rename = "correctAnswer")]
        correct_answer: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("the quiz has not been started")]
    NotStarted,

    #[error("the quiz is no longer in progress ({state:?})")]
    Finished { state: SessionState },

    #[error("question {index} already has a recorded answer")]
    AlreadyAnswered { index: usize },

    #[error("answer {answer_id} does not belong to question {index}")]
    UnknownAnswer { index: usize, answer_id: AnswerId },

    #[error("already at the first question")]
    AtFirstQuestion,

    #[error("cached session is inconsistent: {0}")]
    InvalidCache(String),
}

/// `round(100 * score / total)`, with halves rounded up. Zero questions score 0 %.
pub fn score_percentage(score: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * score + total) / (2 * total)) as u32
}

/// A single attempt at a quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CachedSession")]
pub struct QuizSession {
    questions: Vec<SessionQuestion>,
    state: SessionState,
    score: usize,
    /// Recorded answer per question, indexed like `questions`.
    recorded: Vec<Option<AnswerId>>,
}

/// A session as read from a cache, before it is checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedSession {
    questions: Vec<SessionQuestion>,
    state: SessionState,
    score: usize,
    recorded: Vec<Option<AnswerId>>,
}

impl TryFrom<CachedSession> for QuizSession {
    type Error = SessionError;

    fn try_from(cached: CachedSession) -> Result<Self, Self::Error> {
        let invalid = |detail: String| Err(SessionError::InvalidCache(detail));
        let total = cached.questions.len();

        if cached.recorded.len() != total {
            return invalid(format!(
                "{} recorded answers for {} questions",
                cached.recorded.len(),
                total
            ));
        }
        if let SessionState::InProgress { index } = cached.state {
            if index >= total {
                return invalid(format!("question {index} of {total} is out of range"));
            }
        }

        let mut score = 0;
        let pairs = cached.questions.iter().zip(&cached.recorded);
        for (index, (question, recorded)) in pairs.enumerate() {
            let Some(answer_id) = *recorded else {
                continue;
            };
            match question.answers.iter().find(|a| a.id == answer_id) {
                Some(answer) => score += usize::from(answer.is_correct),
                None => {
                    return invalid(format!(
                        "answer {answer_id} does not belong to question {index}"
                    ))
                }
            }
        }
        if score != cached.score {
            return invalid(format!(
                "score {} does not match the {} correct answers recorded",
                cached.score, score
            ));
        }

        Ok(Self {
            questions: cached.questions,
            state: cached.state,
            score,
            recorded: cached.recorded,
        })
    }
}

impl QuizSession {
    pub fn new(questions: Vec<SessionQuestion>) -> Self {
        let recorded = vec![None; questions.len()];
        Self {
            questions,
            state: SessionState::NotStarted,
            score: 0,
            recorded,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn questions(&self) -> &[SessionQuestion] {
        &self.questions
    }

    /// `NotStarted → InProgress(0)`. An empty quiz is submitted immediately.
    pub fn start(&mut self) -> Result<Step, SessionError> {
        match self.state {
            SessionState::NotStarted => {}
            SessionState::InProgress { .. } => return Ok(Step::Question(self.index()?)),
            state => return Err(SessionError::Finished { state }),
        }
        if self.questions.is_empty() {
            self.state = SessionState::Submitted;
            return Ok(Step::Submitted(self.outcome_now()));
        }
        self.state = SessionState::InProgress { index: 0 };
        Ok(Step::Question(0))
    }

    /// Record `answer_id` for the current question. Returns whether it was
    /// correct. Does not advance.
    pub fn answer(&mut self, answer_id: AnswerId) -> Result<bool, SessionError> {
        let index = self.index()?;
        if self.recorded[index].is_some() {
            return Err(SessionError::AlreadyAnswered { index });
        }
        let answer = self.questions[index]
            .answers
            .iter()
            .find(|a| a.id == answer_id)
            .ok_or(SessionError::UnknownAnswer { index, answer_id })?;

        let correct = answer.is_correct;
        self.recorded[index] = Some(answer_id);
        if correct {
            self.score += 1;
        }
        Ok(correct)
    }

    /// Advance to the next question, or submit after the last one.
    pub fn next(&mut self) -> Result<Step, SessionError> {
        let index = self.index()?;
        if index + 1 < self.questions.len() {
            self.state = SessionState::InProgress { index: index + 1 };
            Ok(Step::Question(index + 1))
        } else {
            self.state = SessionState::Submitted;
            Ok(Step::Submitted(self.outcome_now()))
        }
    }

    /// Step back one question. Recorded answers and the score are kept.
    pub fn prev(&mut self) -> Result<usize, SessionError> {
        let index = self.index()?;
        if index == 0 {
            return Err(SessionError::AtFirstQuestion);
        }
        self.state = SessionState::InProgress { index: index - 1 };
        Ok(index - 1)
    }

    /// Leave the flow without submitting.
    pub fn exit(&mut self) {
        if self.state != SessionState::Submitted {
            self.state = SessionState::Exited;
        }
    }

    pub fn current_question(&self) -> Option<&SessionQuestion> {
        match self.state {
            SessionState::InProgress { index } => self.questions.get(index),
            _ => None,
        }
    }

    /// Answer recorded for the current question.
    pub fn selected_answer(&self) -> Option<AnswerId> {
        match self.state {
            SessionState::InProgress { index } => self.recorded[index],
            _ => None,
        }
    }

    pub fn feedback(&self) -> Option<Feedback> {
        let question = self.current_question()?;
        let selected = self.selected_answer()?;
        let answer = question.answers.iter().find(|a| a.id == selected)?;
        if answer.is_correct {
            Some(Feedback::Correct)
        } else {
            Some(Feedback::Incorrect {
                correct_answer: question.correct_answer().map(str::to_owned),
            })
        }
    }

    /// Progress bar value: share of questions already left behind, 0–100.
    pub fn progress(&self) -> u32 {
        match self.state {
            SessionState::NotStarted | SessionState::Exited => 0,
            SessionState::Submitted => 100,
            SessionState::InProgress { index } => score_percentage(index, self.questions.len()),
        }
    }

    /// The final outcome, once submitted.
    pub fn outcome(&self) -> Option<Outcome> {
        (self.state == SessionState::Submitted).then(|| self.outcome_now())
    }

    fn outcome_now(&self) -> Outcome {
        Outcome {
            score: self.score,
            total_questions: self.questions.len(),
            score_percentage: score_percentage(self.score, self.questions.len()),
        }
    }

    fn index(&self) -> Result<usize, SessionError> {
        match self.state {
            SessionState::InProgress { index } => Ok(index),
            SessionState::NotStarted => Err(SessionError::NotStarted),
            state => Err(SessionError::Finished { state }),
        }
    }
}
