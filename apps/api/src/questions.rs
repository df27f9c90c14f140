//! Question Source — the fixed, ordered bank of interview questions.
//!
//! Loaded once at startup and shared read-only via `Arc`. The key order fixes
//! the interview order and the total question count; the core never reorders
//! or mutates it.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One interview question. `tags` are the rubric labels the grader weighs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub key: String,
    pub prompt: String,
    pub tags: Vec<String>,
}

/// Ordered, immutable question bank.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// The built-in Excel interview set used when no override file is given.
    pub fn builtin() -> Self {
        let q = |key: &str, prompt: &str, tags: &[&str]| Question {
            key: key.to_string(),
            prompt: prompt.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        };
        Self {
            questions: vec![
                q(
                    "lookup_functions",
                    "Explain the difference between VLOOKUP and INDEX/MATCH. \
                     When would you prefer one over the other?",
                    &["vlookup", "index-match", "lookup"],
                ),
                q(
                    "conditional_aggregation",
                    "You have a sales table with columns Region, Product, and Amount. \
                     How would you compute total Amount for a given Region and Product?",
                    &["sumifs", "conditional-aggregation"],
                ),
                q(
                    "pivot_tables",
                    "Describe how you would use a PivotTable to summarize monthly revenue \
                     by region, and how you would add a year-over-year comparison.",
                    &["pivot-tables", "grouping", "calculated-fields"],
                ),
                q(
                    "absolute_relative_refs",
                    "What is the difference between relative, absolute, and mixed cell \
                     references? Give an example where a mixed reference is required.",
                    &["cell-references", "formulas"],
                ),
                q(
                    "data_cleaning",
                    "A column of imported text contains leading spaces, inconsistent casing, \
                     and duplicate rows. Walk through how you would clean it.",
                    &["trim", "text-functions", "remove-duplicates"],
                ),
                q(
                    "error_handling",
                    "Your VLOOKUP formulas show #N/A for some rows. What causes this and \
                     how do you handle it gracefully?",
                    &["iferror", "na-errors", "lookup"],
                ),
                q(
                    "what_if_analysis",
                    "Explain Goal Seek and Data Tables. When would you reach for each in a \
                     financial model?",
                    &["goal-seek", "data-tables", "what-if"],
                ),
            ],
        }
    }

    /// Loads a bank from a JSON file: an array of `{key, prompt, tags}` objects.
    /// Array order defines interview order. Keys must be unique; the bank must
    /// be non-empty.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read question bank at {}", path.display()))?;
        let questions: Vec<Question> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid question bank JSON at {}", path.display()))?;

        if questions.is_empty() {
            bail!("Question bank at {} is empty", path.display());
        }
        let mut seen = HashSet::new();
        for q in &questions {
            if !seen.insert(q.key.as_str()) {
                bail!("Duplicate question key '{}' in {}", q.key, path.display());
            }
        }

        Ok(Self { questions })
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self {
            questions: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn fixture(keys: &[&str]) -> Self {
        Self {
            questions: keys
                .iter()
                .map(|key| Question {
                    key: key.to_string(),
                    prompt: format!("Question about {key}?"),
                    tags: vec![key.to_string()],
                })
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.key == key)
    }

    /// Interview order: the keys in bank order.
    pub fn keys(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_bank_has_unique_keys() {
        let bank = QuestionBank::builtin();
        let keys = bank.keys();
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(keys.len(), unique.len());
        assert!(!bank.is_empty());
    }

    #[test]
    fn test_builtin_bank_lookup_by_key() {
        let bank = QuestionBank::builtin();
        let first_key = bank.keys().into_iter().next().unwrap();
        let question = bank.get(&first_key).unwrap();
        assert_eq!(question.key, first_key);
        assert!(!question.prompt.is_empty());
        assert!(bank.get("no_such_key").is_none());
    }

    #[test]
    fn test_from_file_preserves_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"key": "b", "prompt": "second?", "tags": ["t2"]}},
                {{"key": "a", "prompt": "first?", "tags": ["t1"]}}
            ]"#
        )
        .unwrap();
        let bank = QuestionBank::from_file(file.path()).unwrap();
        assert_eq!(bank.keys(), vec!["b", "a"]);
        assert_eq!(bank.get("a").unwrap().tags, vec!["t1"]);
    }

    #[test]
    fn test_from_file_rejects_duplicate_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"key": "a", "prompt": "one", "tags": []}},
                {{"key": "a", "prompt": "two", "tags": []}}
            ]"#
        )
        .unwrap();
        assert!(QuestionBank::from_file(file.path()).is_err());
    }

    #[test]
    fn test_from_file_rejects_empty_bank() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        assert!(QuestionBank::from_file(file.path()).is_err());
    }
}
