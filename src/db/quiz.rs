use chrono::{DateTime, Utc};

use super::Db;
use crate::error::PersistenceError;
use crate::model::{Answer, GeneratedQuiz, Question, Quiz, QuizSummary};

#[derive(sqlx::FromRow)]
struct QuizRow {
    id: i64,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: i64,
    question_text: String,
}

#[derive(sqlx::FromRow)]
struct AnswerRow {
    id: i64,
    question_id: i64,
    answer_text: String,
    is_correct: bool,
}

impl Db {
    /// Insert a quiz with all its questions and answers in one transaction.
    ///
    /// Either every row is written or none is. Returns the new quiz id.
    pub async fn save_quiz(&self, quiz: &GeneratedQuiz) -> Result<i64, PersistenceError> {
        let mut tx = self.pool.begin().await?;

        // 1. Quiz
        let quiz_id: i64 =
            sqlx::query_scalar("INSERT INTO quizzes (name, description) VALUES (?, ?) RETURNING id")
                .bind(&quiz.name)
                .bind(&quiz.description)
                .fetch_one(&mut *tx)
                .await?;

        for (q_pos, question) in quiz.questions.iter().enumerate() {
            // 2. Question, linked to the quiz
            let question_id: i64 = sqlx::query_scalar(
                "INSERT INTO questions (quiz_id, question_text, position) VALUES (?, ?, ?) RETURNING id",
            )
            .bind(quiz_id)
            .bind(&question.question_text)
            .bind(q_pos as i64)
            .fetch_one(&mut *tx)
            .await?;

            // 3. Answers, linked to the question
            for (a_pos, answer) in question.answers.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO answers (question_id, answer_text, is_correct, position) VALUES (?, ?, ?, ?)",
                )
                .bind(question_id)
                .bind(&answer.answer_text)
                .bind(answer.is_correct)
                .bind(a_pos as i64)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        tracing::info!(
            "new quiz created with id: {quiz_id} ({} questions, {} answers)",
            quiz.questions.len(),
            quiz.answer_count()
        );
        Ok(quiz_id)
    }

    /// Load a quiz with its questions and answers, in insertion order.
    pub async fn get_quiz(&self, quiz_id: i64) -> Result<Quiz, PersistenceError> {
        let row = sqlx::query_as::<_, QuizRow>(
            "SELECT id, name, description, created_at FROM quizzes WHERE id = ?",
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(PersistenceError::NotFound {
            entity: "quiz",
            id: quiz_id,
        })?;

        let question_rows = sqlx::query_as::<_, QuestionRow>(
            "SELECT id, question_text FROM questions WHERE quiz_id = ? ORDER BY position, id",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let answer_rows = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT a.id, a.question_id, a.answer_text, a.is_correct
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE q.quiz_id = ?
            ORDER BY a.question_id, a.position, a.id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let questions = question_rows
            .into_iter()
            .map(|q| Question {
                id: q.id,
                quiz_id,
                question_text: q.question_text,
                answers: answer_rows
                    .iter()
                    .filter(|a| a.question_id == q.id)
                    .map(|a| Answer {
                        id: a.id,
                        question_id: a.question_id,
                        answer_text: a.answer_text.clone(),
                        is_correct: a.is_correct,
                    })
                    .collect(),
            })
            .collect();

        Ok(Quiz {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            questions,
        })
    }

    /// Every stored quiz, newest first.
    pub async fn list_quizzes(&self) -> Result<Vec<QuizSummary>, PersistenceError> {
        let quizzes = sqlx::query_as::<_, QuizSummary>(
            r#"
            SELECT
              quizzes.id AS id,
              quizzes.name AS name,
              quizzes.description AS description,
              COUNT(questions.id) AS question_count,
              quizzes.created_at AS created_at
            FROM
              quizzes
              LEFT JOIN questions ON questions.quiz_id = quizzes.id
            GROUP BY quizzes.id
            ORDER BY quizzes.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes)
    }

    pub(super) async fn quiz_exists(&self, quiz_id: i64) -> Result<bool, PersistenceError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM quizzes WHERE id = ?)")
            .bind(quiz_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}
