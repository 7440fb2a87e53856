// src/quiz/scoring.rs

use crate::{error::QuizError, models::question::AnswerKey};

/// Counts answers matching the key, one point per question.
///
/// Every slot must be filled and the vector must be as long as the key;
/// otherwise nothing is scored.
pub fn score(answers: &[Option<usize>], key: &AnswerKey) -> Result<u32, QuizError> {
    let answered = answers.iter().filter(|a| a.is_some()).count();
    if answers.len() != key.len() || answered != key.len() {
        return Err(QuizError::IncompleteAnswers {
            expected: key.len(),
            answered,
        });
    }

    let correct = answers
        .iter()
        .zip(key.as_slice())
        .filter(|(answer, correct)| **answer == Some(**correct))
        .count();

    Ok(correct as u32)
}
