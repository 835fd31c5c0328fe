//! End-to-end generation: PDF bytes → quiz, optionally persisted.
//!
//! Both the HTTP handler and the `pdfquiz generate` subcommand go through
//! [`generate_quiz`]; the handler then uses [`generate_and_save`] to persist
//! the result and read it back with its generated ids.

use crate::config::QuizConfig;
use crate::db::Db;
use crate::error::QuizgenError;
use crate::model::{GeneratedQuiz, Quiz};
use crate::pipeline::extract::extract_fragments;
use crate::pipeline::llm::{QuizGenerator, UsageEstimate};
use crate::prompts::build_prompt;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// A generated (not yet stored) quiz plus diagnostics.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub quiz: GeneratedQuiz,
    pub usage: UsageEstimate,
    pub stats: GenerationStats,
}

/// Per-request statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationStats {
    /// Pages that yielded text.
    pub pages_with_text: usize,
    /// Characters extracted, before truncation.
    pub extracted_chars: usize,
    /// Characters in the user prompt (instructions included).
    pub prompt_chars: usize,
    /// `true` when the document text was cut to the budget.
    pub truncated: bool,
    pub question_count: usize,
    pub answer_count: usize,
    pub extract_ms: u64,
    pub llm_ms: u64,
    pub total_ms: u64,
}

/// Extract, prompt, and generate.
///
/// Extraction runs before the generator is asked for anything, so an
/// unusable upload is reported as a client error even when no provider is
/// configured.
pub async fn generate_quiz(
    bytes: &[u8],
    config: &QuizConfig,
    generator: &dyn QuizGenerator,
) -> Result<GenerationOutput, QuizgenError> {
    let total_start = Instant::now();

    // ── Step 1: Extract ──────────────────────────────────────────────────
    let fragments = extract_fragments(bytes, &config.page_separator).await?;
    let extract_ms = total_start.elapsed().as_millis() as u64;
    let extracted_chars: usize = fragments.iter().map(|f| f.text.chars().count()).sum();
    if let Some(ref cb) = config.progress_callback {
        cb.on_extracted(fragments.len(), extracted_chars);
    }

    // ── Step 2: Prompt ───────────────────────────────────────────────────
    let prompt = build_prompt(&fragments, config.text_budget);
    let prompt_chars = prompt.chars().count();
    // Join adds one newline between fragments.
    let truncated = extracted_chars + fragments.len().saturating_sub(1) > config.text_budget;
    debug!(
        "Prompt: {} chars from {} pages (truncated: {})",
        prompt_chars,
        fragments.len(),
        truncated
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_start(prompt_chars);
    }

    // ── Step 3: Generate ─────────────────────────────────────────────────
    let generation = match generator.generate(&prompt).await {
        Ok(g) => g,
        Err(e) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_generation_error(&e.to_string());
            }
            return Err(e.into());
        }
    };
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(generation.quiz.questions.len(), generation.duration_ms);
    }

    let stats = GenerationStats {
        pages_with_text: fragments.len(),
        extracted_chars,
        prompt_chars,
        truncated,
        question_count: generation.quiz.questions.len(),
        answer_count: generation.quiz.answer_count(),
        extract_ms,
        llm_ms: generation.duration_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Generated '{}' with {} questions in {}ms",
        generation.quiz.name, stats.question_count, stats.total_ms
    );

    Ok(GenerationOutput {
        quiz: generation.quiz,
        usage: generation.usage,
        stats,
    })
}

/// [`generate_quiz`], then store the quiz and return it with its ids.
pub async fn generate_and_save(
    bytes: &[u8],
    config: &QuizConfig,
    generator: &dyn QuizGenerator,
    db: &Db,
) -> Result<Quiz, QuizgenError> {
    let output = generate_quiz(bytes, config, generator).await?;
    let quiz_id = db.save_quiz(&output.quiz).await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_saved(quiz_id);
    }
    Ok(db.get_quiz(quiz_id).await?)
}
