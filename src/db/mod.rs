//! Persistence gateway over SQLite.
//!
//! [`Db`] is constructed once at startup and handed to whoever needs it;
//! clones share the same pool. The pool opens connections lazily and
//! replaces broken ones, so a transient database failure does not require a
//! restart.

use crate::error::PersistenceError;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

mod migrations;
mod quiz;
mod submission;

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub quizzes: i64,
    pub questions: i64,
    pub answers: i64,
    pub submissions: i64,
}

impl TableCounts {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Main database handle.
#[derive(Clone, Debug)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open (creating if missing) the database at `url`, apply migrations,
    /// and verify the connection.
    ///
    /// `url` is a sqlx SQLite URL such as `sqlite://pdfquiz.db`. Each pooled
    /// connection to `sqlite::memory:` would see its own empty database, so
    /// use a file.
    pub async fn connect(url: &str) -> Result<Self, PersistenceError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        migrations::run(&pool).await?;

        let db = Self { pool };
        db.ping().await?;
        tracing::info!("database connection has been verified");
        Ok(db)
    }

    /// Round-trip `SELECT 1`.
    pub async fn ping(&self) -> Result<(), PersistenceError> {
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        debug_assert_eq!(one, 1);
        Ok(())
    }

    pub async fn counts(&self) -> Result<TableCounts, PersistenceError> {
        let (quizzes, questions, answers, submissions): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
              (SELECT COUNT(*) FROM quizzes),
              (SELECT COUNT(*) FROM questions),
              (SELECT COUNT(*) FROM answers),
              (SELECT COUNT(*) FROM quiz_submissions)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(TableCounts {
            quizzes,
            questions,
            answers,
            submissions,
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
