// src/quiz/review.rs

use serde::Serialize;

use crate::models::question::{OPTION_LABELS, QuestionBank};

/// Per-question breakdown of a finished attempt, in original option order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub student_answer: Option<usize>,
    pub student_label: Option<&'static str>,
    pub correct_index: usize,
    pub correct_label: &'static str,
    pub is_correct: bool,
}

/// Pairs each question with the stored answer at the same position.
///
/// Stored answers are original indices, so the display shuffle plays no part.
pub fn build_review(bank: &QuestionBank, answers: &[usize]) -> Vec<ReviewItem> {
    bank.questions()
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let student_answer = answers.get(i).copied();
            ReviewItem {
                id: q.id,
                question: q.question.clone(),
                options: q.options.clone(),
                student_answer,
                student_label: student_answer.and_then(|a| OPTION_LABELS.get(a).copied()),
                correct_index: q.correct_index,
                correct_label: OPTION_LABELS[q.correct_index],
                is_correct: student_answer == Some(q.correct_index),
            }
        })
        .collect()
}
