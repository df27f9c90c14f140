//! Report Aggregator — numeric scoring plus the end-of-session narrative.
//!
//! The numeric summary is pure arithmetic over the session and is always
//! valid. The narrative is a second LLM call over the serialized transcript;
//! its failure is surfaced to the caller but never invalidates the numbers.

pub mod prompts;

use serde::Serialize;

use crate::grading::parser::{Correctness, MAX_QUESTION_SCORE};
use crate::llm_client::{ChatBackend, ChatRequest, LlmError};
use crate::session::Session;
use prompts::{build_narrative_prompt, NARRATIVE_MAX_TOKENS, NARRATIVE_SYSTEM, NARRATIVE_TEMPERATURE};

/// Numeric session summary. Skipped and errored questions both score 0 but
/// stay distinguishable through the per-outcome counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub total_score: u32,
    pub max_score: u32,
    pub percentage: f64,
    pub answered: usize,
    pub skipped: usize,
    pub errored: usize,
}

/// Computes totals over a session: `max_score = total_questions * 10`,
/// percentage 0 when the question set is empty.
pub fn summarize(session: &Session) -> ScoreSummary {
    let total_score: u32 = session.scores.values().sum();
    let max_score = session.total_questions() as u32 * MAX_QUESTION_SCORE;
    let percentage = if max_score == 0 {
        0.0
    } else {
        f64::from(total_score) / f64::from(max_score) * 100.0
    };

    let mut answered = 0;
    let mut skipped = 0;
    let mut errored = 0;
    for entry in &session.transcript {
        match entry.evaluation.correctness {
            Correctness::Skipped => skipped += 1,
            Correctness::Error => errored += 1,
            _ => answered += 1,
        }
    }

    ScoreSummary {
        total_score,
        max_score,
        percentage,
        answered,
        skipped,
        errored,
    }
}

/// Generates the strengths/weaknesses/next-steps narrative from the full
/// transcript. Free text, trimmed by the backend; no JSON contract here.
pub async fn generate_narrative(
    backend: &dyn ChatBackend,
    session: &Session,
) -> Result<String, LlmError> {
    let transcript_json =
        serde_json::to_string_pretty(&session.transcript).unwrap_or_else(|_| "[]".to_string());

    let request = ChatRequest {
        model: &session.model_id,
        system: NARRATIVE_SYSTEM,
        user: build_narrative_prompt(&transcript_json),
        temperature: NARRATIVE_TEMPERATURE,
        max_tokens: NARRATIVE_MAX_TOKENS,
    };

    backend.complete(request).await
}
