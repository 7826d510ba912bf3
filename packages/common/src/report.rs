use crate::submission::TerminalUpdate;
use crate::{SubmissionStatus, Verdict};
use serde::{Deserialize, Serialize};

/// Result of executing one test case.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestCaseReport {
    pub test_case_id: i32,
    pub verdict: Verdict,
    /// True iff the verdict is `Accepted`.
    pub passed: bool,
    /// Time used, milliseconds.
    pub time_ms: Option<i32>,
    /// Memory used, kilobytes.
    pub memory_kb: Option<i32>,
    /// Program output as captured (already truncated by the executor).
    pub observed_output: Option<String>,
    /// First-mismatch diagnostic, runtime error text, or limit note.
    pub detail: Option<String>,
}

/// Everything judging one submission produced.
///
/// Only status, score, the aggregate metrics and the message reach the
/// submission row; the per-case list and compiler output are kept for logs
/// and operator diagnostics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JudgeReport {
    /// Correlation id of this judging run.
    pub job_id: String,
    pub submission_id: i32,
    pub status: SubmissionStatus,
    pub score: i32,
    /// Maximum across executed cases, milliseconds.
    pub execution_time_ms: Option<i32>,
    /// Maximum across executed cases, kilobytes.
    pub memory_used_kb: Option<i32>,
    /// Compiler stdout/stderr from the first invocation, when present.
    pub compile_output: Option<String>,
    /// Free-text message stored as the submission result.
    pub message: Option<String>,
    pub test_cases: Vec<TestCaseReport>,
}

impl JudgeReport {
    /// Report for a submission the judge could not process at all.
    pub fn system_error(
        job_id: impl Into<String>,
        submission_id: i32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            submission_id,
            status: SubmissionStatus::SystemError,
            score: 0,
            execution_time_ms: None,
            memory_used_kb: None,
            compile_output: None,
            message: Some(message.into()),
            test_cases: vec![],
        }
    }

    /// The store write that finishes the submission this report describes.
    pub fn terminal_update(&self) -> TerminalUpdate {
        TerminalUpdate {
            status: self.status,
            score: self.score,
            execution_time_ms: self.execution_time_ms,
            memory_used_kb: self.memory_used_kb,
            result: self.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_error_report() {
        let report = JudgeReport::system_error("job-1", 42, "executor unavailable");
        assert_eq!(report.status, SubmissionStatus::SystemError);
        assert_eq!(report.score, 0);
        assert!(report.test_cases.is_empty());

        let update = report.terminal_update();
        assert_eq!(update, TerminalUpdate::system_error("executor unavailable"));
    }
}
