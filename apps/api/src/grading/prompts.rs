// All LLM prompt constants for the Grading module.

/// System persona for grading calls — enforces JSON-only output.
pub const GRADER_SYSTEM: &str = "You are a strict JSON-returning Excel interviewer evaluator. \
    Grade the candidate's answer against the question and its rubric tags. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Grading runs deterministic: temperature 0, bounded output.
pub const GRADER_TEMPERATURE: f32 = 0.0;
pub const GRADER_MAX_TOKENS: u32 = 350;

const GRADING_PROMPT_TEMPLATE: &str = r#"Evaluate the candidate's answer to this Excel interview question.

Return a JSON object with this EXACT schema (no extra fields):
{
  "correctness": "correct",
  "score": 8,
  "rationale": "one or two sentences explaining the score",
  "improvements": ["specific suggestion"],
  "canonical_answer": "a model answer or formula"
}

Rules:
- "correctness" is exactly one of: "correct", "partial", "incorrect".
- "score" is an integer from 0 to 10.
- Weigh the answer against the rubric tags; an answer that ignores them cannot score above 5.
- "improvements" may be empty; "canonical_answer" may be an empty string.

QUESTION:
{question}

RUBRIC TAGS: {tags}

CANDIDATE ANSWER:
{answer}"#;

/// Composes the user message for one grading call.
pub fn build_grading_prompt(question: &str, tags: &[String], answer: &str) -> String {
    GRADING_PROMPT_TEMPLATE
        .replace("{question}", question)
        .replace("{tags}", &tags.join(", "))
        .replace("{answer}", answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grading_prompt_embeds_question_tags_and_answer() {
        let tags = vec!["sumifs".to_string(), "lookup".to_string()];
        let prompt = build_grading_prompt("How does SUMIFS work?", &tags, "It sums with criteria.");
        assert!(prompt.contains("How does SUMIFS work?"));
        assert!(prompt.contains("sumifs, lookup"));
        assert!(prompt.contains("It sums with criteria."));
        assert!(!prompt.contains("{question}"));
        assert!(!prompt.contains("{tags}"));
        assert!(!prompt.contains("{answer}"));
    }
}
