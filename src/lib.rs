//! # pdfquiz
//!
//! Generate multiple-choice quizzes from PDF documents with an LLM, store
//! them, and record quiz attempts.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF upload
//!  │
//!  ├─ 1. Extract   page-level text via lopdf (CPU-bound, spawn_blocking)
//!  ├─ 2. Prompt    join pages, cut to the character budget, prefix instructions
//!  ├─ 3. Generate  one LLM call, answer constrained to the quiz JSON Schema
//!  ├─ 4. Validate  strip fences, check the schema, deserialize
//!  └─ 5. Persist   quiz + questions + answers in one SQLite transaction
//! ```
//!
//! The quiz-taking state machine lives in the separate `quiz-session` crate
//! and is re-exported here as [`session`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfquiz::{generate_quiz, LlmQuizGenerator, QuizConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads OPENAI_API_KEY when the generator is called
//!     let config = Arc::new(QuizConfig::default());
//!     let generator = LlmQuizGenerator::new(Arc::clone(&config))?;
//!     let bytes = std::fs::read("notes.pdf")?;
//!     let output = generate_quiz(&bytes, &config, &generator).await?;
//!     println!("{}", serde_json::to_string_pretty(&output.quiz)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfquiz` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod db;
pub mod error;
pub mod generate;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod server;
#[doc(hidden)]
pub mod testing;

pub use quiz_session as session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{QuizConfig, QuizConfigBuilder};
pub use db::{Db, TableCounts};
pub use error::{ExtractionError, GenerationError, PersistenceError, QuizgenError};
pub use generate::{generate_and_save, generate_quiz, GenerationOutput, GenerationStats};
pub use model::{
    Answer, GeneratedAnswer, GeneratedQuestion, GeneratedQuiz, Question, Quiz, QuizSubmission,
    QuizSummary,
};
pub use pipeline::extract::{extract_fragments, inspect, DocumentInfo, TextFragment};
pub use pipeline::llm::{Generation, LlmQuizGenerator, QuizGenerator, UsageEstimate};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use server::{router, AppState};
