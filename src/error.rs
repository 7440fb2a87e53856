// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Domain errors raised by the quiz core (question bank, scorer, store).
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    /// Local, recoverable: the student fixes the input and retries.
    #[error("{0}")]
    Validation(String),

    /// The scorer was called before every slot had an answer.
    #[error("incomplete answers: expected {expected}, {answered} answered")]
    IncompleteAnswers { expected: usize, answered: usize },

    /// The question configuration is malformed. Fails start-up.
    #[error("invalid question configuration: {0}")]
    ConfigInvalid(String),

    /// The session no longer accepts this action (submitted or submitting).
    #[error("{0}")]
    SessionClosed(String),

    /// The submission store could not be reached or rejected the write.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., session already submitted)
    Conflict(String),

    // 503 Service Unavailable (store failure, client may resubmit)
    ServiceUnavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Submission store unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Failed to save answers. Please try again.".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::Validation(_) | QuizError::IncompleteAnswers { .. } => {
                AppError::BadRequest(err.to_string())
            }
            QuizError::SessionClosed(msg) => AppError::Conflict(msg),
            QuizError::StorageUnavailable(msg) => AppError::ServiceUnavailable(msg),
            QuizError::ConfigInvalid(msg) => AppError::InternalServerError(msg),
        }
    }
}

/// Converts `sqlx::Error` into `QuizError::StorageUnavailable`.
/// Allows using `?` operator on store queries.
impl From<sqlx::Error> for QuizError {
    fn from(err: sqlx::Error) -> Self {
        QuizError::StorageUnavailable(err.to_string())
    }
}
