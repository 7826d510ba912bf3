use crate::{Language, SubmissionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on accepted source code size, in characters.
pub const MAX_SOURCE_LEN: usize = 50_000;

/// One code-evaluation request.
///
/// Created by the intake flow in status `Queued`; from then on mutated only
/// by the submission processor, and never deleted by the judging core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
    pub id: i32,
    pub user_id: i32,
    pub problem_id: i32,
    pub contest_id: Option<i32>,
    pub source_code: String,
    pub language: Language,
    pub status: SubmissionStatus,
    /// Free-text result shown to the user (diagnostics, error message).
    pub result: Option<String>,
    pub score: i32,
    /// Maximum time across test cases, milliseconds.
    pub execution_time_ms: Option<i32>,
    /// Maximum memory across test cases, kilobytes.
    pub memory_used_kb: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Error when constructing an invalid submission.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("source code is {len} characters, limit is {MAX_SOURCE_LEN}")]
    SourceTooLong { len: usize },
}

impl Submission {
    /// Builds the record the intake flow hands to the judge, already `Queued`.
    pub fn new(
        id: i32,
        user_id: i32,
        problem_id: i32,
        contest_id: Option<i32>,
        source_code: impl Into<String>,
        language: Language,
    ) -> Result<Self, SubmissionError> {
        let source_code = source_code.into();
        let len = source_code.chars().count();
        if len > MAX_SOURCE_LEN {
            return Err(SubmissionError::SourceTooLong { len });
        }
        Ok(Self {
            id,
            user_id,
            problem_id,
            contest_id,
            source_code,
            language,
            status: SubmissionStatus::Queued,
            result: None,
            score: 0,
            execution_time_ms: None,
            memory_used_kb: None,
            created_at: Utc::now(),
        })
    }
}

/// Final snapshot applied to a submission in one store write.
///
/// Status and the measured fields always change together, so no reader can
/// observe a final status with stale score or metrics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerminalUpdate {
    pub status: SubmissionStatus,
    pub score: i32,
    pub execution_time_ms: Option<i32>,
    pub memory_used_kb: Option<i32>,
    pub result: Option<String>,
}

impl TerminalUpdate {
    /// Update for a submission the judge could not process at all.
    pub fn system_error(message: impl Into<String>) -> Self {
        Self {
            status: SubmissionStatus::SystemError,
            score: 0,
            execution_time_ms: None,
            memory_used_kb: None,
            result: Some(message.into()),
        }
    }
}
