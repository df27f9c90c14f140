//! Evaluation Parser — turns untrusted grader output into a valid
//! `EvaluationResult`, never failing outward.
//!
//! The grader is instructed to return bare JSON but models routinely preface
//! it with prose or append trailing commentary. The parser slices from the
//! first `{` and decodes a single JSON value from that prefix, ignoring
//! anything after the matching close. Any decode failure yields a fully
//! populated `error` evaluation instead of an error.

use serde::{Deserialize, Serialize};

pub const MAX_QUESTION_SCORE: u32 = 10;

/// Grader verdict for one answer. Unknown or missing verdicts decode as
/// `Error` rather than failing the whole evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Correctness {
    Correct,
    Partial,
    Incorrect,
    Skipped,
    #[default]
    #[serde(other)]
    Error,
}

/// Structured grading result for a single answer. Always fully populated:
/// missing fields take schema defaults, scores are clamped to 0–10.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub correctness: Correctness,
    pub score: u32,
    pub rationale: String,
    pub improvements: Vec<String>,
    pub canonical_answer: String,
}

impl EvaluationResult {
    /// The fallback shape for a failed grading call or unparseable output.
    /// Indistinguishable in structure from a normal result so aggregation
    /// never special-cases it.
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            correctness: Correctness::Error,
            score: 0,
            rationale: reason.into(),
            improvements: Vec::new(),
            canonical_answer: String::new(),
        }
    }

    /// The synthesized evaluation for a skipped question.
    pub fn skipped() -> Self {
        Self {
            correctness: Correctness::Skipped,
            score: 0,
            rationale: "skipped".to_string(),
            improvements: Vec::new(),
            canonical_answer: String::new(),
        }
    }
}

/// Wire shape as the grader emits it: every field optional, score unclamped.
#[derive(Debug, Deserialize)]
struct RawEvaluation {
    #[serde(default)]
    correctness: Correctness,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    rationale: String,
    #[serde(default)]
    improvements: Vec<String>,
    #[serde(default)]
    canonical_answer: String,
}

impl RawEvaluation {
    fn normalize(self) -> EvaluationResult {
        EvaluationResult {
            correctness: self.correctness,
            score: self.score.clamp(0, MAX_QUESTION_SCORE as i64) as u32,
            rationale: self.rationale,
            improvements: self.improvements,
            canonical_answer: self.canonical_answer,
        }
    }
}

/// Tagged parse result. Both arms carry a fully populated evaluation and
/// satisfy the same downstream contract; `Fallback` additionally records why
/// the grader's output could not be decoded.
#[derive(Debug)]
pub enum ParseOutcome {
    Parsed(EvaluationResult),
    Fallback(EvaluationResult, String),
}

/// Extracts an `EvaluationResult` from raw grader text.
///
/// Slices from the first `{` (models may preface the JSON with prose), then
/// decodes one JSON value from that point. Trailing text after the object is
/// ignored: the deserializer stops at the first complete value.
pub fn parse_evaluation(raw: &str) -> ParseOutcome {
    let Some(start) = raw.find('{') else {
        let reason = "no JSON object found in grader output".to_string();
        return ParseOutcome::Fallback(EvaluationResult::error(&reason), reason);
    };

    let candidate = &raw[start..];
    let mut de = serde_json::Deserializer::from_str(candidate);
    match RawEvaluation::deserialize(&mut de) {
        Ok(parsed) => ParseOutcome::Parsed(parsed.normalize()),
        Err(e) => {
            let reason = format!("grader output is not valid JSON: {e}");
            ParseOutcome::Fallback(EvaluationResult::error(&reason), reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluation_of(raw: &str) -> EvaluationResult {
        match parse_evaluation(raw) {
            ParseOutcome::Parsed(ev) | ParseOutcome::Fallback(ev, _) => ev,
        }
    }

    #[test]
    fn test_parses_bare_json_object() {
        let raw = r#"{"correctness":"correct","score":8,"rationale":"ok","improvements":["use SUMIFS"],"canonical_answer":"=SUMIFS(...)"}"#;
        let ParseOutcome::Parsed(ev) = parse_evaluation(raw) else {
            panic!("expected Parsed");
        };
        assert_eq!(ev.correctness, Correctness::Correct);
        assert_eq!(ev.score, 8);
        assert_eq!(ev.rationale, "ok");
        assert_eq!(ev.improvements, vec!["use SUMIFS"]);
        assert_eq!(ev.canonical_answer, "=SUMIFS(...)");
    }

    #[test]
    fn test_parses_json_prefaced_with_prose() {
        let raw = r#"Sure! {"correctness":"correct","score":8,"rationale":"ok","improvements":["use SUMIFS"],"canonical_answer":"=SUMIFS(...)"}"#;
        let ev = evaluation_of(raw);
        assert_eq!(ev.correctness, Correctness::Correct);
        assert_eq!(ev.score, 8);
    }

    #[test]
    fn test_tolerates_trailing_text_after_object() {
        let raw = r#"{"correctness":"partial","score":5,"rationale":"half right"} Hope that helps!"#;
        let ParseOutcome::Parsed(ev) = parse_evaluation(raw) else {
            panic!("expected Parsed despite trailing text");
        };
        assert_eq!(ev.correctness, Correctness::Partial);
        assert_eq!(ev.score, 5);
    }

    #[test]
    fn test_non_json_falls_back_to_error_evaluation() {
        let outcome = parse_evaluation("not json at all");
        let ParseOutcome::Fallback(ev, reason) = outcome else {
            panic!("expected Fallback");
        };
        assert_eq!(ev.correctness, Correctness::Error);
        assert_eq!(ev.score, 0);
        assert!(!ev.rationale.is_empty());
        assert!(ev.improvements.is_empty());
        assert_eq!(ev.canonical_answer, "");
        assert!(!reason.is_empty());
    }

    #[test]
    fn test_truncated_json_falls_back() {
        let outcome = parse_evaluation(r#"{"correctness":"correct","score":"#);
        assert!(matches!(outcome, ParseOutcome::Fallback(_, _)));
    }

    #[test]
    fn test_missing_fields_take_schema_defaults() {
        let ev = evaluation_of(r#"{"score": 7}"#);
        assert_eq!(ev.score, 7);
        assert_eq!(ev.correctness, Correctness::Error);
        assert_eq!(ev.rationale, "");
        assert!(ev.improvements.is_empty());
        assert_eq!(ev.canonical_answer, "");
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let high = evaluation_of(r#"{"correctness":"correct","score":42}"#);
        assert_eq!(high.score, 10);
        let low = evaluation_of(r#"{"correctness":"incorrect","score":-3}"#);
        assert_eq!(low.score, 0);
    }

    #[test]
    fn test_unknown_correctness_decodes_as_error_variant() {
        let ev = evaluation_of(r#"{"correctness":"mostly right","score":6}"#);
        assert_eq!(ev.correctness, Correctness::Error);
        assert_eq!(ev.score, 6);
    }

    #[test]
    fn test_skipped_constructor_shape() {
        let ev = EvaluationResult::skipped();
        assert_eq!(ev.correctness, Correctness::Skipped);
        assert_eq!(ev.score, 0);
        assert_eq!(ev.rationale, "skipped");
    }
}
