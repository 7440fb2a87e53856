// src/store/sqlite.rs

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::SubmissionStore;
use crate::{
    error::QuizError,
    models::submission::{NewSubmission, Submission},
};

#[derive(Clone)]
pub struct SqliteSubmissionStore {
    pool: SqlitePool,
}

impl SqliteSubmissionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for SqliteSubmissionStore {
    async fn record(&self, submission: NewSubmission) -> Result<i64, QuizError> {
        let answers = serde_json::to_string(&submission.answers)
            .map_err(|e| QuizError::StorageUnavailable(e.to_string()))?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO submissions
                (student_name, telegram_handle, answers, score, total_questions, submitted_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&submission.student_name)
        .bind(&submission.telegram_handle)
        .bind(answers)
        .bind(i64::from(submission.score))
        .bind(i64::from(submission.total_questions))
        .bind(submission.submitted_at.timestamp_millis())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert submission: {:?}", e);
            QuizError::from(e)
        })?;

        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<Submission>, QuizError> {
        let rows = sqlx::query_as::<_, Submission>(
            r#"
            SELECT id, student_name, telegram_handle, answers, score, total_questions, submitted_at
            FROM submissions
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list submissions: {:?}", e);
            QuizError::from(e)
        })?;

        Ok(rows)
    }

    async fn find(&self, id: i64) -> Result<Option<Submission>, QuizError> {
        let row = sqlx::query_as::<_, Submission>(
            r#"
            SELECT id, student_name, telegram_handle, answers, score, total_questions, submitted_at
            FROM submissions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
