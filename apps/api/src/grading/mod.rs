//! Grading Client Adapter — one deterministic grading call per answer.
//!
//! Failure policy per the interview design: a failed call or unparseable
//! response becomes a score-0 `error` evaluation and the session advances.
//! Nothing in this module errors outward, and nothing is retried — the
//! candidate may re-submit on the next question only by design of the fixed
//! sequence.

pub mod parser;
pub mod prompts;

use tracing::{debug, warn};

use crate::llm_client::{ChatBackend, ChatRequest};
use crate::questions::Question;
use parser::{parse_evaluation, EvaluationResult, ParseOutcome};
use prompts::{build_grading_prompt, GRADER_MAX_TOKENS, GRADER_SYSTEM, GRADER_TEMPERATURE};

/// The evaluation plus the verbatim grader text (or an `ERROR:` sentinel)
/// recorded into the transcript.
#[derive(Debug)]
pub struct GradedAnswer {
    pub evaluation: EvaluationResult,
    pub raw: String,
}

/// Grades one answer. Infallible by contract: transport failures and
/// malformed grader output both fold into the fallback evaluation.
pub async fn grade_answer(
    backend: &dyn ChatBackend,
    model: &str,
    question: &Question,
    answer: &str,
) -> GradedAnswer {
    let request = ChatRequest {
        model,
        system: GRADER_SYSTEM,
        user: build_grading_prompt(&question.prompt, &question.tags, answer),
        temperature: GRADER_TEMPERATURE,
        max_tokens: GRADER_MAX_TOKENS,
    };

    match backend.complete(request).await {
        Ok(text) => match parse_evaluation(&text) {
            ParseOutcome::Parsed(evaluation) => {
                debug!(
                    question_key = %question.key,
                    score = evaluation.score,
                    "answer graded"
                );
                GradedAnswer {
                    evaluation,
                    raw: text,
                }
            }
            ParseOutcome::Fallback(evaluation, reason) => {
                warn!(question_key = %question.key, %reason, "grader output unparseable");
                GradedAnswer {
                    evaluation,
                    raw: format!("ERROR: {reason}"),
                }
            }
        },
        Err(e) => {
            warn!(question_key = %question.key, error = %e, "grading call failed");
            GradedAnswer {
                evaluation: EvaluationResult::error(e.to_string()),
                raw: format!("ERROR: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use async_trait::async_trait;

    struct CannedBackend(&'static str);

    #[async_trait]
    impl ChatBackend for CannedBackend {
        async fn complete(&self, _request: ChatRequest<'_>) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl ChatBackend for FailingBackend {
        async fn complete(&self, _request: ChatRequest<'_>) -> Result<String, LlmError> {
            Err(LlmError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            })
        }
    }

    fn question() -> Question {
        Question {
            key: "lookup_functions".to_string(),
            prompt: "Explain VLOOKUP.".to_string(),
            tags: vec!["lookup".to_string()],
        }
    }

    #[tokio::test]
    async fn test_successful_grade_keeps_verbatim_raw_text() {
        let backend =
            CannedBackend(r#"{"correctness":"correct","score":9,"rationale":"solid"}"#);
        let graded = grade_answer(&backend, "gpt-4o-mini", &question(), "It looks up.").await;
        assert_eq!(graded.evaluation.score, 9);
        assert!(graded.raw.starts_with('{'));
    }

    #[tokio::test]
    async fn test_unparseable_output_marks_raw_with_error_sentinel() {
        let backend = CannedBackend("I refuse to answer in JSON.");
        let graded = grade_answer(&backend, "gpt-4o-mini", &question(), "answer").await;
        assert_eq!(graded.evaluation.score, 0);
        assert!(graded.raw.starts_with("ERROR: "));
    }

    #[tokio::test]
    async fn test_transport_failure_folds_into_error_evaluation() {
        let graded = grade_answer(&FailingBackend, "gpt-4o-mini", &question(), "answer").await;
        assert_eq!(graded.evaluation.score, 0);
        assert!(graded.evaluation.rationale.contains("503"));
        assert!(graded.raw.starts_with("ERROR: "));
    }
}
