//! Pipeline stages for PDF-to-quiz generation.
//!
//! Each submodule implements one transformation step and is testable on its
//! own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ (prompts) ──▶ llm ──▶ postprocess
//! (CLI only) (lopdf)                  (LLM)   (JSON + schema)
//! ```
//!
//! 1. [`input`]  : read a local path or download a URL into memory (CLI)
//! 2. [`extract`]: page-level text fragments; runs in `spawn_blocking`
//!    because parsing is CPU-bound
//! 3. [`llm`]    : the only stage with network I/O, behind the
//!    [`llm::QuizGenerator`] trait
//! 4. [`postprocess`]: turn raw model text into a validated
//!    [`crate::model::GeneratedQuiz`]

pub mod extract;
pub mod input;
pub mod llm;
pub mod postprocess;
