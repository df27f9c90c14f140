//! Transcript Persister — durable JSON record per completed session.
//!
//! One file per session id; re-saving the same session overwrites the
//! previous record. Writes go through a temp file in the target directory
//! followed by an atomic rename, so readers never observe a partial record.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use crate::report::ScoreSummary;
use crate::session::{Session, TranscriptEntry};
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct TranscriptRecord<'a> {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    transcript: &'a [TranscriptEntry],
    total_score: u32,
    max_score: u32,
}

/// Serializes the finished session to `<dir>/transcript_<session_id>.json`
/// and returns the written path.
pub fn save_transcript(dir: &Path, session: &Session, summary: &ScoreSummary) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create transcript directory {}", dir.display()))?;

    let record = TranscriptRecord {
        session_id: session.session_id,
        started_at: session.started_at,
        completed_at: Utc::now(),
        transcript: &session.transcript,
        total_score: summary.total_score,
        max_score: summary.max_score,
    };

    let path = dir.join(format!("transcript_{}.json", session.session_id));

    // Temp file must live in the target directory: rename is only atomic
    // within one filesystem.
    let tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    serde_json::to_writer_pretty(&tmp, &record).context("Failed to serialize transcript")?;
    tmp.persist(&path)
        .with_context(|| format!("Failed to persist transcript to {}", path.display()))?;

    info!(session_id = %session.session_id, path = %path.display(), "transcript saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::QuestionBank;
    use crate::report::summarize;
    use std::sync::Arc;

    fn completed_session() -> Session {
        let mut session = Session::new(
            Arc::new(QuestionBank::fixture(&["q1", "q2"])),
            false,
            "gpt-4o-mini".to_string(),
        );
        while !session.completed {
            session.skip_question();
        }
        session
    }

    #[test]
    fn test_saved_record_round_trips_expected_fields() {
        let dir = tempfile::tempdir().unwrap();
        let session = completed_session();
        let summary = summarize(&session);

        let path = save_transcript(dir.path(), &session, &summary).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(
            value["session_id"].as_str().unwrap(),
            session.session_id.to_string()
        );
        assert_eq!(value["transcript"].as_array().unwrap().len(), 2);
        assert_eq!(value["total_score"], 0);
        assert_eq!(value["max_score"], 20);
        assert!(value["completed_at"].is_string());
    }

    #[test]
    fn test_resaving_overwrites_single_record() {
        let dir = tempfile::tempdir().unwrap();
        let session = completed_session();
        let summary = summarize(&session);

        let first = save_transcript(dir.path(), &session, &summary).unwrap();
        let second = save_transcript(dir.path(), &session, &summary).unwrap();
        assert_eq!(first, second);

        // Exactly one transcript file for this id, matching the last save
        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_string_lossy()
                    .starts_with(&format!("transcript_{}", session.session_id))
            })
            .collect();
        assert_eq!(files.len(), 1);

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&second).unwrap()).unwrap();
        assert_eq!(value["max_score"], 20);
    }

    #[test]
    fn test_distinct_sessions_write_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = completed_session();
        let b = completed_session();

        let path_a = save_transcript(dir.path(), &a, &summarize(&a)).unwrap();
        let path_b = save_transcript(dir.path(), &b, &summarize(&b)).unwrap();
        assert_ne!(path_a, path_b);
        assert!(path_a.exists());
        assert!(path_b.exists());
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("records").join("2026");
        let session = completed_session();

        let path = save_transcript(&nested, &session, &summarize(&session)).unwrap();
        assert!(path.exists());
    }
}
