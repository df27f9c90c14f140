//! Session State Machine — owns interview progress for one candidate.
//!
//! A `Session` walks the fixed question order exactly once: each submit or
//! skip appends one transcript entry, records one score, and advances the
//! index. Entries are never re-evaluated or removed; `completed` flips
//! false→true when the index reaches the end and only `reset` leaves that
//! state. Transitions return a `StepOutcome` the presentation layer
//! interprets — the core assumes no rendering or event-loop mechanism.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::grading::parser::EvaluationResult;
use crate::grading::{grade_answer, GradedAnswer};
use crate::llm_client::ChatBackend;
use crate::questions::{Question, QuestionBank};

/// One answered or skipped question. Append-only; the question text is
/// snapshotted so later edits to the bank cannot rewrite history.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub question_key: String,
    pub question: String,
    /// Empty string when the question was skipped.
    pub answer: String,
    /// Verbatim grader text, the sentinel "skipped", or "ERROR: <description>".
    pub evaluation_raw: String,
    pub evaluation: EvaluationResult,
    pub timestamp: DateTime<Utc>,
}

/// What the presentation layer should do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The answer was empty or whitespace-only; nothing changed. Re-prompt.
    PromptAgain,
    /// Entry recorded; move on to the question at `next_index`.
    Advance { next_index: usize },
    /// Entry recorded and the interview is finished.
    Completed,
}

/// One end-to-end interview run. Mutated exclusively through the transition
/// methods below; a caller-side store keys live sessions by `session_id`.
///
/// Invariants while in progress:
/// `transcript.len() == scores.len() == current_index`, and
/// `completed == (current_index == question_order.len())`.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    bank: Arc<QuestionBank>,
    pub question_order: Vec<String>,
    pub current_index: usize,
    pub transcript: Vec<TranscriptEntry>,
    pub scores: HashMap<String, u32>,
    pub completed: bool,
    /// Practice mode surfaces each evaluation immediately; interview mode
    /// defers feedback to the final report.
    pub practice_mode: bool,
    pub model_id: String,
}

impl Session {
    pub fn new(bank: Arc<QuestionBank>, practice_mode: bool, model_id: String) -> Self {
        let question_order = bank.keys();
        let completed = bank.is_empty();
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            bank,
            question_order,
            current_index: 0,
            transcript: Vec::new(),
            scores: HashMap::new(),
            completed,
            practice_mode,
            model_id,
        }
    }

    pub fn total_questions(&self) -> usize {
        self.question_order.len()
    }

    /// The question awaiting an answer, or `None` once completed.
    pub fn current_question(&self) -> Option<&Question> {
        self.question_order
            .get(self.current_index)
            .and_then(|key| self.bank.get(key))
    }

    /// Grades and records an answer to the current question, advancing on
    /// completion of the (possibly errored) evaluation. Empty or
    /// whitespace-only answers change nothing. One outbound LLM call.
    pub async fn submit_answer(&mut self, backend: &dyn ChatBackend, answer: &str) -> StepOutcome {
        let Some(question) = self.current_question() else {
            return StepOutcome::Completed;
        };
        if answer.trim().is_empty() {
            return StepOutcome::PromptAgain;
        }

        let question = question.clone();
        let GradedAnswer { evaluation, raw } =
            grade_answer(backend, &self.model_id, &question, answer).await;

        self.record(TranscriptEntry {
            question_key: question.key,
            question: question.prompt,
            answer: answer.to_string(),
            evaluation_raw: raw,
            evaluation,
            timestamp: Utc::now(),
        })
    }

    /// Records the current question as skipped (score 0) and advances.
    /// No outbound call.
    pub fn skip_question(&mut self) -> StepOutcome {
        let Some(question) = self.current_question() else {
            return StepOutcome::Completed;
        };
        let question = question.clone();

        self.record(TranscriptEntry {
            question_key: question.key,
            question: question.prompt,
            answer: String::new(),
            evaluation_raw: "skipped".to_string(),
            evaluation: EvaluationResult::skipped(),
            timestamp: Utc::now(),
        })
    }

    /// A fresh session over the same bank, mode, and model choice: new
    /// identifier, new timestamp, empty transcript and scores.
    pub fn reset(&self) -> Session {
        Session::new(self.bank.clone(), self.practice_mode, self.model_id.clone())
    }

    fn record(&mut self, entry: TranscriptEntry) -> StepOutcome {
        self.scores
            .insert(entry.question_key.clone(), entry.evaluation.score);
        self.transcript.push(entry);
        self.current_index += 1;

        if self.current_index == self.question_order.len() {
            self.completed = true;
            StepOutcome::Completed
        } else {
            StepOutcome::Advance {
                next_index: self.current_index,
            }
        }
    }
}

/// In-memory session store keyed by session id.
///
/// Each session sits behind its own `tokio::sync::Mutex`, held for the full
/// duration of a transition including the grading call — no second transition
/// is accepted for a session while one is outstanding. Distinct sessions
/// never contend.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<Session>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Session) -> Uuid {
        let id = session.session_id;
        self.inner
            .lock()
            .expect("session store lock poisoned")
            .insert(id, Arc::new(tokio::sync::Mutex::new(session)));
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<tokio::sync::Mutex<Session>>> {
        self.inner
            .lock()
            .expect("session store lock poisoned")
            .get(id)
            .cloned()
    }

    /// Drops the old identifier and registers the replacement session.
    pub fn replace(&self, old_id: &Uuid, fresh: Session) -> Uuid {
        let id = fresh.session_id;
        let mut map = self.inner.lock().expect("session store lock poisoned");
        map.remove(old_id);
        map.insert(id, Arc::new(tokio::sync::Mutex::new(fresh)));
        id
    }
}
