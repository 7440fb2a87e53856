// src/handlers/dashboard.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use serde::Serialize;

use crate::{
    config::Config,
    error::AppError,
    models::{
        question::QuestionBank,
        submission::{Submission, sort_for_dashboard},
    },
    quiz::review::{ReviewItem, build_review},
    store::SubmissionStore,
    utils::report::{export_csv, format_local_datetime},
};

/// One dashboard row: the stored record plus display fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRow {
    pub rank: usize,
    #[serde(flatten)]
    pub submission: Submission,
    pub percentage: i64,
    pub submitted_at_local: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDetail {
    #[serde(flatten)]
    pub submission: Submission,
    pub percentage: i64,
    pub submitted_at_local: String,
    pub questions: Vec<ReviewItem>,
}

async fn sorted_submissions(store: &dyn SubmissionStore) -> Result<Vec<Submission>, AppError> {
    let mut submissions = store.list_all().await?;
    sort_for_dashboard(&mut submissions);
    Ok(submissions)
}

/// Lists every submission, best score first, newest first on ties.
pub async fn list_submissions(
    State(store): State<Arc<dyn SubmissionStore>>,
    State(config): State<Config>,
) -> Result<impl IntoResponse, AppError> {
    let offset = config.report_offset();
    let rows: Vec<DashboardRow> = sorted_submissions(store.as_ref())
        .await?
        .into_iter()
        .enumerate()
        .map(|(i, submission)| DashboardRow {
            rank: i + 1,
            percentage: submission.percentage(),
            submitted_at_local: format_local_datetime(submission.submitted_at, offset),
            submission,
        })
        .collect();

    Ok(Json(rows))
}

/// One submission with its per-question breakdown.
pub async fn get_submission(
    State(store): State<Arc<dyn SubmissionStore>>,
    State(bank): State<Arc<QuestionBank>>,
    State(config): State<Config>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let submission = store
        .find(id)
        .await?
        .ok_or(AppError::NotFound("Submission not found".to_string()))?;

    let questions = build_review(&bank, &submission.answers);

    Ok(Json(SubmissionDetail {
        percentage: submission.percentage(),
        submitted_at_local: format_local_datetime(submission.submitted_at, config.report_offset()),
        questions,
        submission,
    }))
}

/// Downloads all submissions as `results.csv`, in dashboard order.
pub async fn export_submissions(
    State(store): State<Arc<dyn SubmissionStore>>,
    State(config): State<Config>,
) -> Result<impl IntoResponse, AppError> {
    let submissions = sorted_submissions(store.as_ref()).await?;
    let body = export_csv(&submissions, config.report_offset())?;

    tracing::info!("Exported {} submissions", submissions.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"results.csv\""),
        ],
        body,
    ))
}
