mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pdfquiz::{router, AppState, LlmQuizGenerator, QuizConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{app_state, blank_pdf, multipart_body, quiz_with_questions, sky_pdf, sky_quiz, StubGenerator};

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("router should respond");
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

fn upload(field: &str, pdf: &[u8]) -> Request<Body> {
    let (content_type, body) = multipart_body(field, pdf);
    Request::builder()
        .method(Method::POST)
        .uri("/api/quiz/generate")
        .header("content-type", content_type)
        .body(Body::from(body))
        .expect("request build should succeed")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request build should succeed")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request build should succeed")
}

fn error_message(body: &Value) -> &str {
    body["error"].as_str().expect("error body must carry an `error` string")
}

#[tokio::test]
async fn sky_is_blue_end_to_end() {
    let generator = StubGenerator::returning(sky_quiz());
    let state = app_state(generator.clone()).await;
    let db = state.db.clone();
    let app = router(state);

    let (status, quiz) = send(&app, upload("pdf", &sky_pdf())).await;
    assert_eq!(status, StatusCode::OK, "body: {quiz}");
    let quiz_id = quiz["id"].as_i64().expect("quiz id");

    // The document text reached the model.
    assert_eq!(generator.call_count(), 1);
    let prompt = generator.prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("The sky is blue."), "prompt: {prompt}");

    let (status, fetched) = send(&app, get(&format!("/api/quiz/{quiz_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], quiz_id);

    let questions = fetched["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 1);
    let answers = questions[0]["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 4);
    let correct: Vec<_> = answers
        .iter()
        .filter(|a| a["isCorrect"] == json!(true))
        .collect();
    assert_eq!(correct.len(), 1);
    assert_eq!(correct[0]["answerText"], "Blue");

    let counts = db.counts().await.unwrap();
    assert_eq!((counts.quizzes, counts.questions, counts.answers), (1, 1, 4));
}

#[tokio::test]
async fn zero_text_pdf_is_rejected_and_nothing_is_written() {
    let generator = StubGenerator::returning(sky_quiz());
    let state = app_state(generator.clone()).await;
    let db = state.db.clone();
    let app = router(state);

    let (status, body) = send(&app, upload("pdf", &blank_pdf())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!error_message(&body).is_empty());
    assert_eq!(generator.call_count(), 0);
    assert!(db.counts().await.unwrap().is_empty());
}

#[tokio::test]
async fn upload_over_the_size_limit_is_rejected() {
    let generator = StubGenerator::returning(sky_quiz());
    let state = AppState {
        config: Arc::new(QuizConfig::builder().max_upload_bytes(1024).build().unwrap()),
        ..app_state(generator.clone()).await
    };
    let db = state.db.clone();
    let app = router(state);

    let mut pdf = sky_pdf();
    pdf.resize(4 * 1024, b' ');
    let (status, body) = send(&app, upload("pdf", &pdf)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!error_message(&body).is_empty(), "body: {body}");
    assert_eq!(generator.call_count(), 0);
    assert!(db.counts().await.unwrap().is_empty());
}

#[tokio::test]
async fn not_a_pdf_is_a_client_error() {
    let app = router(app_state(StubGenerator::returning(sky_quiz())).await);
    let (status, body) = send(&app, upload("pdf", b"just some text")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("not a PDF"), "body: {body}");
}

#[tokio::test]
async fn missing_pdf_field_is_a_client_error() {
    let app = router(app_state(StubGenerator::returning(sky_quiz())).await);
    let (status, body) = send(&app, upload("document", &sky_pdf())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("pdf"), "body: {body}");
}

#[tokio::test]
async fn missing_api_key_is_a_server_error() {
    let config = Arc::new(
        QuizConfig::builder()
            .api_key_env("PDFQUIZ_API_TEST_KEY_THAT_IS_NEVER_SET")
            .build()
            .unwrap(),
    );
    let generator = Arc::new(LlmQuizGenerator::new(Arc::clone(&config)).unwrap());
    let state = AppState {
        db: common::create_test_db().await,
        generator,
        config,
    };
    let db = state.db.clone();
    let app = router(state);

    let (status, body) = send(&app, upload("pdf", &sky_pdf())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        error_message(&body).contains("PDFQUIZ_API_TEST_KEY_THAT_IS_NEVER_SET"),
        "body: {body}"
    );
    assert!(db.counts().await.unwrap().is_empty());
}

#[tokio::test]
async fn generation_failure_is_surfaced_verbatim() {
    let app = router(app_state(Arc::new(StubGenerator::default())).await);
    let (status, body) = send(&app, upload("pdf", &sky_pdf())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(error_message(&body).contains("stub has no quiz"), "body: {body}");
}

#[tokio::test]
async fn unknown_quiz_is_404() {
    let app = router(app_state(StubGenerator::returning(sky_quiz())).await);
    let (status, body) = send(&app, get("/api/quiz/12345")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "quiz 12345 not found");

    let (status, _) = send(&app, get("/api/quiz/not-a-number")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submissions_are_saved_and_listed() {
    let state = app_state(StubGenerator::returning(quiz_with_questions(3))).await;
    let quiz_id = state.db.save_quiz(&quiz_with_questions(3)).await.unwrap();
    let app = router(state);

    let body = json!({ "score": 2, "quizId": quiz_id });
    let (status, first) = send(&app, post_json("/api/submissions", body.clone())).await;
    assert_eq!(status, StatusCode::OK, "body: {first}");
    // No idempotency key: a retry stores a second row.
    let (status, second) = send(&app, post_json("/api/submissions", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(first["id"], second["id"]);

    let (status, list) = send(&app, get(&format!("/api/quiz/{quiz_id}/submissions"))).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["score"], 2);
    assert_eq!(list[0]["quizId"], quiz_id);
}

#[tokio::test]
async fn bad_submissions_are_rejected() {
    let app = router(app_state(StubGenerator::returning(sky_quiz())).await);

    let (status, body) = send(&app, post_json("/api/submissions", json!({ "score": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!error_message(&body).is_empty());

    let (status, _) = send(
        &app,
        post_json("/api/submissions", json!({ "score": -1, "quizId": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        post_json("/api/submissions", json!({ "score": 1, "quizId": 777 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "quiz 777 not found");
}

#[tokio::test]
async fn quizzes_are_listed_newest_first() {
    let state = app_state(StubGenerator::returning(sky_quiz())).await;
    let older = state.db.save_quiz(&sky_quiz()).await.unwrap();
    let newer = state.db.save_quiz(&quiz_with_questions(2)).await.unwrap();
    let app = router(state);

    let (status, list) = send(&app, get("/api/quizzes")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![newer, older]);
    assert_eq!(list[0]["questionCount"], 2);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = router(app_state(StubGenerator::returning(sky_quiz())).await);
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}
