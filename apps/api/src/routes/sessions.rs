//! Session handlers — the HTTP surface over the state machine.
//!
//! Handlers translate `StepOutcome` values into responses; all interview
//! semantics live in the session module. Each transition handler holds the
//! session's mutex for the whole operation, so a second submit for the same
//! session waits for the outstanding grading call to finish.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ALLOWED_MODELS;
use crate::errors::AppError;
use crate::grading::parser::EvaluationResult;
use crate::persist::save_transcript;
use crate::report::{generate_narrative, summarize, ScoreSummary};
use crate::session::{Session, StepOutcome, TranscriptEntry};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Practice mode returns each evaluation immediately after grading.
    #[serde(default)]
    pub practice_mode: bool,
    /// Grading model; must be on the allow-list. Defaults from config.
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub key: String,
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub practice_mode: bool,
    pub model: String,
    pub current_index: usize,
    pub total_questions: usize,
    pub completed: bool,
    /// The question awaiting an answer; absent once completed.
    pub question: Option<QuestionView>,
}

impl SessionView {
    fn from_session(session: &Session) -> Self {
        let question = session.current_question().map(|q| QuestionView {
            index: session.current_index,
            total: session.total_questions(),
            key: q.key.clone(),
            prompt: q.prompt.clone(),
        });
        Self {
            session_id: session.session_id,
            started_at: session.started_at,
            practice_mode: session.practice_mode,
            model: session.model_id.clone(),
            current_index: session.current_index,
            total_questions: session.total_questions(),
            completed: session.completed,
            question,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub outcome: StepOutcome,
    pub completed: bool,
    /// Next question to present, when the outcome advances.
    pub question: Option<QuestionView>,
    /// Present in practice mode only; interview mode defers feedback
    /// to the final report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationResult>,
}

#[derive(Debug, Serialize)]
pub struct FinalReport {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub summary: ScoreSummary,
    pub breakdown: Vec<TranscriptEntry>,
    /// Narrative critique, or `narrative_error` when that call failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_error: Option<String>,
}

fn fetch_session(
    state: &AppState,
    id: &Uuid,
) -> Result<Arc<tokio::sync::Mutex<Session>>, AppError> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

fn ensure_in_progress(session: &Session) -> Result<(), AppError> {
    if session.completed {
        return Err(AppError::Conflict(
            "Session is already completed; reset to start a new interview".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<SessionView>, AppError> {
    let model = match req.model {
        Some(model) if ALLOWED_MODELS.contains(&model.as_str()) => model,
        Some(model) => {
            return Err(AppError::Validation(format!(
                "Unknown model '{model}'; allowed: {}",
                ALLOWED_MODELS.join(", ")
            )))
        }
        None => state.config.default_model.clone(),
    };

    let session = Session::new(state.questions.clone(), req.practice_mode, model);
    let view = SessionView::from_session(&session);
    let id = state.sessions.insert(session);
    info!(session_id = %id, practice_mode = req.practice_mode, "session created");
    Ok(Json(view))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = fetch_session(&state, &id)?;
    let session = handle.lock().await;
    Ok(Json(SessionView::from_session(&session)))
}

/// POST /api/v1/sessions/:id/answer
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<StepResponse>, AppError> {
    let handle = fetch_session(&state, &id)?;
    let mut session = handle.lock().await;
    ensure_in_progress(&session)?;

    let outcome = session.submit_answer(state.chat.as_ref(), &req.answer).await;

    let evaluation = match outcome {
        StepOutcome::PromptAgain => None,
        _ if session.practice_mode => session.transcript.last().map(|e| e.evaluation.clone()),
        _ => None,
    };

    Ok(Json(StepResponse {
        outcome,
        completed: session.completed,
        question: SessionView::from_session(&session).question,
        evaluation,
    }))
}

/// POST /api/v1/sessions/:id/skip
pub async fn handle_skip_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StepResponse>, AppError> {
    let handle = fetch_session(&state, &id)?;
    let mut session = handle.lock().await;
    ensure_in_progress(&session)?;

    let outcome = session.skip_question();

    Ok(Json(StepResponse {
        outcome,
        completed: session.completed,
        question: SessionView::from_session(&session).question,
        evaluation: None,
    }))
}

/// POST /api/v1/sessions/:id/reset
/// Discards the session and returns a fresh one under a new identifier.
pub async fn handle_reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = fetch_session(&state, &id)?;
    // Waits for any outstanding transition before discarding.
    let fresh = handle.lock().await.reset();
    let view = SessionView::from_session(&fresh);
    let new_id = state.sessions.replace(&id, fresh);
    info!(old_session_id = %id, session_id = %new_id, "session reset");
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/report
/// Finalizes a completed session: numeric summary, narrative critique, and
/// transcript persistence. Narrative and persistence failures are reported
/// inline — the numeric report is valid regardless.
pub async fn handle_final_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FinalReport>, AppError> {
    let handle = fetch_session(&state, &id)?;
    let session = handle.lock().await;

    if !session.completed {
        return Err(AppError::Conflict(format!(
            "Interview is not finished ({} of {} questions)",
            session.current_index,
            session.total_questions()
        )));
    }

    let summary = summarize(&session);

    let (narrative, narrative_error) = match generate_narrative(state.chat.as_ref(), &session).await
    {
        Ok(text) => (Some(text), None),
        Err(e) => {
            warn!(session_id = %id, error = %e, "narrative generation failed");
            (None, Some(e.to_string()))
        }
    };

    let (transcript_path, persist_error) =
        match save_transcript(&state.config.data_dir, &session, &summary) {
            Ok(path) => (Some(path.display().to_string()), None),
            Err(e) => {
                warn!(session_id = %id, error = %e, "transcript persistence failed");
                (None, Some(e.to_string()))
            }
        };

    Ok(Json(FinalReport {
        session_id: session.session_id,
        summary,
        breakdown: session.transcript.clone(),
        narrative,
        narrative_error,
        transcript_path,
        persist_error,
    }))
}
