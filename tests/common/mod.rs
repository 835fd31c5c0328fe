#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pdfquiz::{
    AppState, Db, GeneratedAnswer, GeneratedQuestion, GeneratedQuiz, Generation, GenerationError,
    QuizConfig, QuizGenerator, UsageEstimate,
};

pub async fn create_test_db() -> Db {
    create_test_db_with_url().await.0
}

/// A fresh database plus its URL, for tests that need a second connection.
pub async fn create_test_db_with_url() -> (Db, String) {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!("pdfquiz_test_{}_{}.db", std::process::id(), id));
    // Clean up leftover file from previous runs
    let _ = std::fs::remove_file(&path);
    let url = format!("sqlite://{}", path.display());
    let db = Db::connect(&url).await.expect("failed to create test database");
    (db, url)
}

/// In-memory PDF with one page per entry; `None` is a page without text.
pub fn pdf_with_pages(pages: &[Option<&str>]) -> Vec<u8> {
    pdfquiz::testing::pdf_with_pages(pages).expect("build pdf")
}

pub fn sky_pdf() -> Vec<u8> {
    pdf_with_pages(&[Some("The sky is blue.")])
}

pub fn blank_pdf() -> Vec<u8> {
    pdf_with_pages(&[None])
}

fn answer(text: &str, is_correct: bool) -> GeneratedAnswer {
    GeneratedAnswer {
        answer_text: text.to_string(),
        is_correct,
    }
}

pub fn sky_quiz() -> GeneratedQuiz {
    GeneratedQuiz {
        name: "The Sky".to_string(),
        description: "A quiz about the colour of the sky.".to_string(),
        questions: vec![GeneratedQuestion {
            question_text: "What colour is the sky?".to_string(),
            answers: vec![
                answer("Blue", true),
                answer("Green", false),
                answer("Red", false),
                answer("Yellow", false),
            ],
        }],
    }
}

/// `n` questions with four answers each, the first one correct.
pub fn quiz_with_questions(n: usize) -> GeneratedQuiz {
    GeneratedQuiz {
        name: format!("Quiz with {n} questions"),
        description: "Generated for tests.".to_string(),
        questions: (0..n)
            .map(|i| GeneratedQuestion {
                question_text: format!("Question {}", i + 1),
                answers: (0..4)
                    .map(|j| answer(&format!("Answer {}.{}", i + 1, j + 1), j == 0))
                    .collect(),
            })
            .collect(),
    }
}

/// Returns a canned quiz and records every prompt it receives.
#[derive(Default)]
pub struct StubGenerator {
    pub quiz: Option<GeneratedQuiz>,
    pub calls: AtomicUsize,
    pub prompts: std::sync::Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn returning(quiz: GeneratedQuiz) -> Arc<Self> {
        Arc::new(Self {
            quiz: Some(quiz),
            ..Default::default()
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuizGenerator for StubGenerator {
    async fn generate(&self, prompt: &str) -> Result<Generation, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let quiz = self.quiz.clone().ok_or_else(|| GenerationError::Api {
            message: "stub has no quiz".to_string(),
        })?;
        Ok(Generation {
            quiz,
            usage: UsageEstimate::default(),
            duration_ms: 1,
        })
    }
}

pub async fn app_state(generator: Arc<dyn QuizGenerator>) -> AppState {
    AppState {
        db: create_test_db().await,
        generator,
        config: Arc::new(QuizConfig::default()),
    }
}

/// Multipart body with a single file field.
pub fn multipart_body(field: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "pdfquiz-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"doc.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}
