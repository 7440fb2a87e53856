// src/quiz/session.rs

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{
    scoring,
    shuffle::{ShuffledOption, shuffle_all},
};
use crate::{
    error::QuizError,
    models::question::QuestionBank,
    utils::hash::{identity_seed, trim_identity},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    InProgress,
    /// A submit call is waiting on the store.
    Submitting,
    Submitted { score: u32, submission_id: i64 },
}

/// Answers and score handed to the store by `begin_submit`.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub answers: Vec<usize>,
    pub score: u32,
}

/// Everything one student's attempt owns: identity, seed, shuffled view and answers.
///
/// The shuffle is computed once here and never re-derived.
#[derive(Debug)]
pub struct QuizSession {
    pub id: Uuid,
    pub student_name: String,
    pub telegram_handle: String,
    pub seed: u32,
    pub started_at: DateTime<Utc>,
    shuffled: Vec<Vec<ShuffledOption>>,
    answers: Vec<Option<usize>>,
    status: SessionStatus,
}

impl QuizSession {
    pub fn start(name: &str, handle: &str, bank: &QuestionBank) -> Result<Self, QuizError> {
        let student_name = trim_identity(name);
        let telegram_handle = trim_identity(handle);
        if student_name.is_empty() || telegram_handle.is_empty() {
            return Err(QuizError::Validation("Fill in all fields".to_string()));
        }

        let seed = identity_seed(student_name, telegram_handle);

        Ok(Self {
            id: Uuid::new_v4(),
            student_name: student_name.to_string(),
            telegram_handle: telegram_handle.to_string(),
            seed,
            started_at: Utc::now(),
            shuffled: shuffle_all(bank.questions(), seed),
            answers: vec![None; bank.len()],
            status: SessionStatus::InProgress,
        })
    }

    pub fn shuffled(&self) -> &[Vec<ShuffledOption>] {
        &self.shuffled
    }

    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    /// Records a choice by its original (unshuffled) option index.
    pub fn select(&mut self, question_index: usize, original_index: usize) -> Result<(), QuizError> {
        if self.status != SessionStatus::InProgress {
            return Err(QuizError::SessionClosed(
                "Answers can no longer be changed".to_string(),
            ));
        }

        let option_count = self
            .shuffled
            .get(question_index)
            .map(Vec::len)
            .ok_or_else(|| {
                QuizError::Validation(format!("Unknown question index {}", question_index))
            })?;

        if original_index >= option_count {
            return Err(QuizError::Validation(format!(
                "Option {} out of range for question {}",
                original_index,
                question_index + 1
            )));
        }

        self.answers[question_index] = Some(original_index);
        Ok(())
    }

    /// Completeness gate plus scoring. Marks the session as submitting.
    ///
    /// An unanswered slot is rejected here, before the scorer or store is reached.
    pub fn begin_submit(&mut self, bank: &QuestionBank) -> Result<PendingSubmission, QuizError> {
        match self.status {
            SessionStatus::InProgress => {}
            SessionStatus::Submitting => {
                return Err(QuizError::SessionClosed(
                    "Submission already in progress".to_string(),
                ));
            }
            SessionStatus::Submitted { .. } => {
                return Err(QuizError::SessionClosed("Answers already submitted".to_string()));
            }
        }

        let answers: Vec<usize> = self
            .answers
            .iter()
            .copied()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| QuizError::Validation("Answer all questions".to_string()))?;

        let score = scoring::score(&self.answers, bank.answer_key())?;
        self.status = SessionStatus::Submitting;

        Ok(PendingSubmission { answers, score })
    }

    /// Settles a submit started with `begin_submit`.
    ///
    /// On failure the session goes back to in-progress with its answers intact.
    pub fn finish_submit(&mut self, score: u32, outcome: &Result<i64, QuizError>) {
        self.status = match outcome {
            Ok(submission_id) => SessionStatus::Submitted {
                score,
                submission_id: *submission_id,
            },
            Err(_) => SessionStatus::InProgress,
        };
    }

    /// Reopens a session whose submit never settled.
    pub fn abandon_submit(&mut self) {
        if self.status == SessionStatus::Submitting {
            self.status = SessionStatus::InProgress;
        }
    }
}

/// Abandons the submit when dropped while still armed.
///
/// Covers a handler future cancelled mid-store-call (client gone, timeout):
/// the session returns to in-progress instead of staying `Submitting`.
pub struct SubmitGuard {
    session: Arc<Mutex<QuizSession>>,
    armed: bool,
}

impl SubmitGuard {
    pub fn new(session: Arc<Mutex<QuizSession>>) -> Self {
        Self {
            session,
            armed: true,
        }
    }

    /// Settles the submit and disarms the guard once the lock is held.
    pub async fn finish(mut self, score: u32, outcome: &Result<i64, QuizError>) {
        let mut session = self.session.lock().await;
        session.finish_submit(score, outcome);
        self.armed = false;
    }
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut session) = self.session.try_lock() {
            session.abandon_submit();
            return;
        }
        // Lock is busy; reset as soon as it frees up.
        let session = self.session.clone();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                session.lock().await.abandon_submit();
            });
        }
    }
}

struct SessionEntry {
    created: Instant,
    session: Arc<Mutex<QuizSession>>,
}

/// Live sessions keyed by id. Each session has its own lock.
///
/// Sessions expire `ttl` after they start, submitted or not.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            ttl,
        }
    }

    pub async fn insert(&self, session: QuizSession) -> Arc<Mutex<QuizSession>> {
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(
            id,
            SessionEntry {
                created: Instant::now(),
                session: handle.clone(),
            },
        );
        handle
    }

    /// Looks up a live session. Expired entries read as absent.
    pub async fn get(&self, id: &Uuid) -> Option<Arc<Mutex<QuizSession>>> {
        let now = Instant::now();
        self.sessions
            .read()
            .await
            .get(id)
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| entry.session.clone())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every session whose TTL has run out at `now`. Returns how many went.
    pub async fn evict_expired_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        before - sessions.len()
    }

    /// Sweeps expired sessions every `period` for the life of the runtime.
    pub fn spawn_sweeper(&self, period: Duration) -> tokio::task::JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let evicted = registry.evict_expired_at(Instant::now()).await;
                if evicted > 0 {
                    tracing::debug!("Evicted {} expired quiz sessions", evicted);
                }
            }
        })
    }

    fn is_expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.created) >= self.ttl
    }
}
