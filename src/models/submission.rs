// src/models/submission.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

/// Represents the 'submissions' table in the database.
/// Written once per successful submit; never updated or deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i64,
    pub student_name: String,
    pub telegram_handle: String,

    /// Original (unshuffled) option index per question.
    /// Stored as a JSON array in the database.
    pub answers: Json<Vec<usize>>,

    pub score: i64,
    pub total_questions: i64,

    /// Unix epoch milliseconds.
    pub submitted_at: i64,
}

impl Submission {
    pub fn submitted_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.submitted_at)
    }

    /// Rounded percentage of correct answers.
    pub fn percentage(&self) -> i64 {
        if self.total_questions <= 0 {
            return 0;
        }
        ((self.score as f64 / self.total_questions as f64) * 100.0).round() as i64
    }
}

/// Insert payload for the submission store.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub student_name: String,
    pub telegram_handle: String,
    pub answers: Vec<usize>,
    pub score: u32,
    pub total_questions: u32,
    pub submitted_at: DateTime<Utc>,
}

/// Sorts for the dashboard: highest score first, newest first on ties.
pub fn sort_for_dashboard(submissions: &mut [Submission]) {
    submissions.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.submitted_at.cmp(&a.submitted_at))
    });
}

/// DTO for starting a quiz session.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub student_name: String,
    pub telegram_handle: String,
}

/// DTO for selecting an option in a session.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectAnswerRequest {
    pub original_index: usize,
}

/// DTO for the one-shot submit call (identity plus a full answer vector).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    pub student_name: String,
    pub telegram_handle: String,
    pub answers: Vec<Option<usize>>,
}

/// Result of a successful submit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizResponse {
    pub submission_id: i64,
    pub score: u32,
    pub total_questions: u32,
}
