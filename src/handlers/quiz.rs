// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, QuizError},
    models::{
        question::{PublicQuestion, QuestionBank},
        session::{ProgressView, SessionView},
        submission::{
            NewSubmission, SelectAnswerRequest, StartSessionRequest, SubmitQuizRequest,
            SubmitQuizResponse,
        },
    },
    quiz::{
        QuizSession, SessionRegistry,
        review::build_review,
        session::{PendingSubmission, SessionStatus, SubmitGuard},
    },
    state::AppState,
};

/// Lists the question set without correct answers.
pub async fn list_questions(State(bank): State<Arc<QuestionBank>>) -> impl IntoResponse {
    let questions: Vec<PublicQuestion> = bank.questions().iter().map(PublicQuestion::from).collect();
    Json(questions)
}

/// Starts a quiz session.
///
/// * Rejects blank name or handle.
/// * Derives the seed from the trimmed identity and shuffles every question once.
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = QuizSession::start(&req.student_name, &req.telegram_handle, &state.bank)?;
    let view = SessionView::new(&session, &state.bank);

    tracing::info!(
        session_id = %session.id,
        student = %session.student_name,
        seed = session.seed,
        "Quiz session started"
    );
    state.sessions.insert(session).await;
    tracing::debug!("{} live sessions", state.sessions.len().await);

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_session(
    State(sessions): State<SessionRegistry>,
    State(bank): State<Arc<QuestionBank>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = sessions
        .get(&id)
        .await
        .ok_or(AppError::NotFound("Session not found".to_string()))?;

    let session = handle.lock().await;
    Ok(Json(SessionView::new(&session, &bank)))
}

/// Records the student's choice for one question, by original option index.
pub async fn select_answer(
    State(sessions): State<SessionRegistry>,
    Path((id, question_index)): Path<(Uuid, usize)>,
    Json(req): Json<SelectAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let handle = sessions
        .get(&id)
        .await
        .ok_or(AppError::NotFound("Session not found".to_string()))?;

    let mut session = handle.lock().await;
    session.select(question_index, req.original_index)?;

    Ok(Json(ProgressView::new(&session)))
}

/// Submits a session's answers.
///
/// * Rejects the call if any question is unanswered (nothing is scored or stored).
/// * Scores against the answer key and writes one submission record.
/// * On store failure the session keeps its answers so the student can resubmit.
pub async fn submit_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state
        .sessions
        .get(&id)
        .await
        .ok_or(AppError::NotFound("Session not found".to_string()))?;

    // Lock is released before the store round-trip; status `Submitting` blocks re-entry.
    let (pending, student_name, telegram_handle) = {
        let mut session = handle.lock().await;
        let pending = session.begin_submit(&state.bank)?;
        (
            pending,
            session.student_name.clone(),
            session.telegram_handle.clone(),
        )
    };
    // Reopens the session if this future is dropped before the store answers.
    let guard = SubmitGuard::new(handle.clone());

    let score = pending.score;
    let outcome = persist(&state, student_name, telegram_handle, pending).await;

    guard.finish(score, &outcome).await;
    let submission_id = outcome?;

    tracing::info!(session_id = %id, submission_id, score, "Quiz submitted");

    Ok(Json(SubmitQuizResponse {
        submission_id,
        score,
        total_questions: state.bank.len() as u32,
    }))
}

/// Per-question breakdown, available once the session has been submitted.
pub async fn review_session(
    State(sessions): State<SessionRegistry>,
    State(bank): State<Arc<QuestionBank>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = sessions
        .get(&id)
        .await
        .ok_or(AppError::NotFound("Session not found".to_string()))?;

    let session = handle.lock().await;
    let SessionStatus::Submitted { score, .. } = session.status() else {
        return Err(AppError::Conflict("Session has not been submitted yet".to_string()));
    };

    let answers: Vec<usize> = session.answers().iter().flatten().copied().collect();

    Ok(Json(serde_json::json!({
        "score": score,
        "totalQuestions": bank.len(),
        "questions": build_review(&bank, &answers),
    })))
}

/// One-shot submit: identity plus a complete answer vector in original indices.
///
/// Runs the same checks as a session (identity, ranges, completeness) without
/// registering one.
pub async fn submit_quiz(
    State(state): State<AppState>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.answers.len() != state.bank.len() {
        return Err(AppError::BadRequest(format!(
            "Expected {} answers, got {}",
            state.bank.len(),
            req.answers.len()
        )));
    }

    let mut session = QuizSession::start(&req.student_name, &req.telegram_handle, &state.bank)?;
    for (question_index, answer) in req.answers.iter().enumerate() {
        if let Some(original_index) = answer {
            session.select(question_index, *original_index)?;
        }
    }
    let pending = session.begin_submit(&state.bank)?;

    let score = pending.score;
    let submission_id = persist(
        &state,
        session.student_name,
        session.telegram_handle,
        pending,
    )
    .await?;

    tracing::info!(submission_id, score, "Quiz submitted without session");

    Ok(Json(SubmitQuizResponse {
        submission_id,
        score,
        total_questions: state.bank.len() as u32,
    }))
}

/// Writes one record, giving up after the configured store timeout.
async fn persist(
    state: &AppState,
    student_name: String,
    telegram_handle: String,
    pending: PendingSubmission,
) -> Result<i64, QuizError> {
    let record = state.store.record(NewSubmission {
        student_name,
        telegram_handle,
        answers: pending.answers,
        score: pending.score,
        total_questions: state.bank.len() as u32,
        submitted_at: Utc::now(),
    });

    let timeout = state.config.store_timeout();
    tokio::time::timeout(timeout, record).await.unwrap_or_else(|_| {
        Err(QuizError::StorageUnavailable(format!(
            "store did not answer within {:?}",
            timeout
        )))
    })
}
