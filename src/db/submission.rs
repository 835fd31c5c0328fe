use super::Db;
use crate::error::PersistenceError;
use crate::model::QuizSubmission;

impl Db {
    /// Record one completed attempt and return its id.
    ///
    /// There is no idempotency key: calling this twice with the same
    /// arguments stores two rows.
    pub async fn save_submission(&self, quiz_id: i64, score: i64) -> Result<i64, PersistenceError> {
        if !self.quiz_exists(quiz_id).await? {
            return Err(PersistenceError::NotFound {
                entity: "quiz",
                id: quiz_id,
            });
        }

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO quiz_submissions (quiz_id, score) VALUES (?, ?) RETURNING id",
        )
        .bind(quiz_id)
        .bind(score)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("submission {id} saved for quiz {quiz_id} with score {score}");
        Ok(id)
    }

    /// Submissions for one quiz, oldest first.
    pub async fn list_submissions(
        &self,
        quiz_id: i64,
    ) -> Result<Vec<QuizSubmission>, PersistenceError> {
        let submissions = sqlx::query_as::<_, QuizSubmission>(
            "SELECT id, quiz_id, score, created_at FROM quiz_submissions WHERE quiz_id = ? ORDER BY id",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(submissions)
    }
}
