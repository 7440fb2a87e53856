// src/models/session.rs

use serde::Serialize;
use uuid::Uuid;

use crate::{
    models::question::{OPTION_LABELS, QuestionBank},
    quiz::session::{QuizSession, SessionStatus},
};

/// An option as the student sees it: display label plus its original index.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayOption {
    pub label: &'static str,
    pub original_index: usize,
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuestion {
    pub id: i64,
    pub question: String,
    pub options: Vec<DisplayOption>,
    /// Selected original index, if any.
    pub selected: Option<usize>,
}

/// DTO for a running or finished quiz session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: Uuid,
    pub student_name: String,
    pub telegram_handle: String,
    pub questions: Vec<SessionQuestion>,
    pub answered_count: usize,
    pub total_questions: usize,
    pub submitted: bool,
    pub score: Option<u32>,
    pub submission_id: Option<i64>,
}

impl SessionView {
    pub fn new(session: &QuizSession, bank: &QuestionBank) -> Self {
        let questions = bank
            .questions()
            .iter()
            .zip(session.shuffled())
            .zip(session.answers())
            .map(|((q, shuffled), selected)| SessionQuestion {
                id: q.id,
                question: q.question.clone(),
                options: shuffled
                    .iter()
                    .zip(OPTION_LABELS)
                    .map(|(opt, label)| DisplayOption {
                        label,
                        original_index: opt.original_index,
                        text: opt.text.clone(),
                    })
                    .collect(),
                selected: *selected,
            })
            .collect();

        let (submitted, score, submission_id) = match session.status() {
            SessionStatus::Submitted {
                score,
                submission_id,
            } => (true, Some(score), Some(submission_id)),
            _ => (false, None, None),
        };

        Self {
            session_id: session.id,
            student_name: session.student_name.clone(),
            telegram_handle: session.telegram_handle.clone(),
            questions,
            answered_count: session.answered_count(),
            total_questions: bank.len(),
            submitted,
            score,
            submission_id,
        }
    }
}

/// Progress returned after each selection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub answered_count: usize,
    pub total_questions: usize,
    pub percent: usize,
}

impl ProgressView {
    pub fn new(session: &QuizSession) -> Self {
        let total_questions = session.answers().len();
        let answered_count = session.answered_count();
        let percent = if total_questions == 0 {
            0
        } else {
            (answered_count as f64 / total_questions as f64 * 100.0).round() as usize
        };
        Self {
            answered_count,
            total_questions,
            percent,
        }
    }
}
