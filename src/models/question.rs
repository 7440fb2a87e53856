// src/models/question.rs

use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::QuizError;

/// Display labels for option positions. Also caps the option count.
pub const OPTION_LABELS: [&str; 5] = ["A", "B", "C", "D", "E"];

/// One entry of the static question configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,

    /// Prompt text.
    #[validate(length(min = 1, max = 1000))]
    pub question: String,

    /// Option texts in their original (unshuffled) order.
    #[validate(length(min = 2, max = 5), custom(function = validate_options))]
    pub options: Vec<String>,

    /// 0-based index into `options`.
    pub correct_index: usize,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// DTO for sending a question to the student (no correct index).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question: q.question.clone(),
            options: q.options.clone(),
        }
    }
}

/// Correct original-option index per question, aligned with the question list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerKey(Vec<usize>);

impl AnswerKey {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

/// The validated, read-only question set loaded at start-up.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
    key: AnswerKey,
}

impl QuestionBank {
    /// Validates every question and derives the answer key.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::ConfigInvalid("question list is empty".to_string()));
        }

        let mut seen_ids = HashSet::new();
        for (position, q) in questions.iter().enumerate() {
            q.validate().map_err(|e| {
                QuizError::ConfigInvalid(format!("question #{} (id {}): {}", position + 1, q.id, e))
            })?;

            if q.correct_index >= q.options.len() {
                return Err(QuizError::ConfigInvalid(format!(
                    "question #{} (id {}): correctIndex {} out of range for {} options",
                    position + 1,
                    q.id,
                    q.correct_index,
                    q.options.len()
                )));
            }

            if !seen_ids.insert(q.id) {
                return Err(QuizError::ConfigInvalid(format!("duplicate question id {}", q.id)));
            }
        }

        let key = AnswerKey::new(questions.iter().map(|q| q.correct_index).collect());
        Ok(Self { questions, key })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, QuizError> {
        let questions: Vec<Question> =
            serde_json::from_str(raw).map_err(|e| QuizError::ConfigInvalid(e.to_string()))?;
        Self::new(questions)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuizError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| QuizError::ConfigInvalid(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answer_key(&self) -> &AnswerKey {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }
}
