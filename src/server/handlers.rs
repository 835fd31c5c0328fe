use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{error::ApiError, AppState};
use crate::error::{ExtractionError, QuizgenError};
use crate::generate::generate_and_save;
use crate::model::{Quiz, QuizSubmission, QuizSummary};

/// Multipart field that carries the document.
pub const PDF_FIELD: &str = "pdf";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/quiz/generate", post(generate))
        .route("/api/quiz/{id}", get(get_quiz))
        .route("/api/quiz/{id}/submissions", get(list_submissions))
        .route("/api/quizzes", get(list_quizzes))
        .route("/api/submissions", post(save_submission))
        .route("/health", get(health))
}

async fn generate(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Quiz>, ApiError> {
    let mut pdf = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError {
        status: e.status(),
        message: format!("failed to read multipart body: {}", e.body_text()),
    })? {
        if field.name() != Some(PDF_FIELD) {
            continue;
        }
        let bytes = field.bytes().await.map_err(|e| ApiError {
            status: e.status(),
            message: format!("failed to read the '{PDF_FIELD}' field: {}", e.body_text()),
        })?;
        pdf = Some(bytes);
    }

    let pdf = pdf.ok_or_else(|| {
        ApiError::bad_request(format!("missing '{PDF_FIELD}' field in the form data"))
    })?;
    if pdf.is_empty() {
        return Err(QuizgenError::from(ExtractionError::EmptyUpload).into());
    }

    tracing::info!("generating quiz from a {} byte upload", pdf.len());
    let quiz = generate_and_save(&pdf, &state.config, state.generator.as_ref(), &state.db).await?;
    Ok(Json(quiz))
}

async fn get_quiz(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Quiz>, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let quiz = state.db.get_quiz(id).await.map_err(QuizgenError::from)?;
    Ok(Json(quiz))
}

async fn list_quizzes(State(state): State<AppState>) -> Result<Json<Vec<QuizSummary>>, ApiError> {
    let quizzes = state.db.list_quizzes().await.map_err(QuizgenError::from)?;
    Ok(Json(quizzes))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionBody {
    score: i64,
    quiz_id: i64,
}

#[derive(Debug, Serialize)]
struct Created {
    id: i64,
}

async fn save_submission(
    State(state): State<AppState>,
    body: Result<Json<SubmissionBody>, JsonRejection>,
) -> Result<Json<Created>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    if body.score < 0 {
        return Err(ApiError::bad_request("score must not be negative"));
    }

    let id = state
        .db
        .save_submission(body.quiz_id, body.score)
        .await
        .map_err(QuizgenError::from)?;
    Ok(Json(Created { id }))
}

async fn list_submissions(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<QuizSubmission>>, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let submissions = state
        .db
        .list_submissions(id)
        .await
        .map_err(QuizgenError::from)?;
    Ok(Json(submissions))
}

async fn health(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!("health check failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}
