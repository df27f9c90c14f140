use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ChatBackend;
use crate::questions::QuestionBank;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    /// Immutable question bank loaded once at startup.
    pub questions: Arc<QuestionBank>,
    /// Pluggable chat backend. Hosted API by default; swap via LLM_BACKEND env.
    pub chat: Arc<dyn ChatBackend>,
    pub config: Config,
}
