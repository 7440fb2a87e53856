// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config, models::question::QuestionBank, quiz::SessionRegistry,
    store::SubmissionStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SubmissionStore>,
    pub bank: Arc<QuestionBank>,
    pub sessions: SessionRegistry,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn SubmissionStore>, bank: QuestionBank, config: Config) -> Self {
        Self {
            store,
            bank: Arc::new(bank),
            sessions: SessionRegistry::new(config.session_ttl()),
            config,
        }
    }
}

impl FromRef<AppState> for Arc<dyn SubmissionStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Arc<QuestionBank> {
    fn from_ref(state: &AppState) -> Self {
        state.bank.clone()
    }
}

impl FromRef<AppState> for SessionRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
