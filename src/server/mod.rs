//! HTTP surface.
//!
//! | Method | Path                         | Body                 |
//! |--------|------------------------------|----------------------|
//! | POST   | `/api/quiz/generate`         | multipart, `pdf`     |
//! | GET    | `/api/quiz/{id}`             |                      |
//! | GET    | `/api/quiz/{id}/submissions` |                      |
//! | GET    | `/api/quizzes`               |                      |
//! | POST   | `/api/submissions`           | `{score, quizId}`    |
//! | GET    | `/health`                    |                      |
//!
//! Every failure is rendered as `{"error": "..."}`.

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::PDF_FIELD;

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;

use crate::config::QuizConfig;
use crate::db::Db;
use crate::pipeline::llm::QuizGenerator;

/// Shared per-request state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub generator: Arc<dyn QuizGenerator>,
    pub config: Arc<QuizConfig>,
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .merge(handlers::routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `address` and serve until Ctrl-C.
pub async fn serve(address: &str, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
}
