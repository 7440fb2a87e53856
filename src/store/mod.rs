// src/store/mod.rs

pub mod sqlite;

use async_trait::async_trait;

use crate::{
    error::QuizError,
    models::submission::{NewSubmission, Submission},
};

pub use sqlite::SqliteSubmissionStore;

/// Where finished attempts go. Failures surface as `QuizError::StorageUnavailable`.
///
/// There is no idempotency key: a client retrying after a reported failure can
/// create a second row if the first write actually landed.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Inserts one record and returns its identifier. No retries.
    async fn record(&self, submission: NewSubmission) -> Result<i64, QuizError>;

    /// Every record, in no particular order.
    async fn list_all(&self) -> Result<Vec<Submission>, QuizError>;

    async fn find(&self, id: i64) -> Result<Option<Submission>, QuizError>;
}
