// All LLM prompt constants for the Report module.

/// System persona for the end-of-session narrative.
pub const NARRATIVE_SYSTEM: &str = "You are a friendly career coach and Excel expert.";

/// The narrative is allowed a little variety, unlike grading.
pub const NARRATIVE_TEMPERATURE: f32 = 0.2;
pub const NARRATIVE_MAX_TOKENS: u32 = 400;

const NARRATIVE_PROMPT_PREFIX: &str = "You are an expert interviewer. \
    Given these Q&A evaluations, produce 3 short paragraphs: \
    strengths, weaknesses, and recommended next steps.\n\n";

/// Composes the narrative request: instruction followed by the serialized
/// transcript.
pub fn build_narrative_prompt(transcript_json: &str) -> String {
    format!("{NARRATIVE_PROMPT_PREFIX}{transcript_json}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrative_prompt_appends_transcript() {
        let prompt = build_narrative_prompt(r#"[{"question_key":"lookup_functions"}]"#);
        assert!(prompt.contains("strengths, weaknesses, and recommended next steps"));
        assert!(prompt.ends_with(r#"[{"question_key":"lookup_functions"}]"#));
    }
}
