use crate::SubmissionStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of judging one test case, or of a whole submission.
///
/// Verdicts are values, never errors: everything the judged program did
/// wrong travels through this enum, while `Err` is reserved for failures of
/// the judge itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Verdict {
    Accepted,
    WrongAnswer,
    PresentationError,
    RuntimeError,
    MemoryLimitExceeded,
    TimeLimitExceeded,
    SystemError,
    CompilationError,
}

impl Verdict {
    /// All verdict values, in ascending severity.
    pub const ALL: &'static [Verdict] = &[
        Self::Accepted,
        Self::WrongAnswer,
        Self::PresentationError,
        Self::RuntimeError,
        Self::MemoryLimitExceeded,
        Self::TimeLimitExceeded,
        Self::SystemError,
        Self::CompilationError,
    ];

    /// Rank used to decide the overall verdict of a submission: scanning the
    /// test cases in order keeps the highest-severity verdict seen.
    pub fn severity(&self) -> u8 {
        match self {
            Self::Accepted => 0,
            Self::WrongAnswer => 1,
            Self::PresentationError => 2,
            Self::RuntimeError => 3,
            Self::MemoryLimitExceeded => 4,
            Self::TimeLimitExceeded => 5,
            Self::SystemError => 6,
            Self::CompilationError => 7,
        }
    }

    /// The final submission status corresponding to this overall verdict.
    pub fn status(&self) -> SubmissionStatus {
        match self {
            Self::Accepted => SubmissionStatus::Accepted,
            Self::WrongAnswer => SubmissionStatus::WrongAnswer,
            Self::PresentationError => SubmissionStatus::PresentationError,
            Self::RuntimeError => SubmissionStatus::RuntimeError,
            Self::MemoryLimitExceeded => SubmissionStatus::MemoryLimitExceeded,
            Self::TimeLimitExceeded => SubmissionStatus::TimeLimitExceeded,
            Self::SystemError => SubmissionStatus::SystemError,
            Self::CompilationError => SubmissionStatus::CompilationError,
        }
    }

    /// Returns true if this verdict means the test case (or submission) passed.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Returns the string representation (PascalCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::WrongAnswer => "WrongAnswer",
            Self::PresentationError => "PresentationError",
            Self::RuntimeError => "RuntimeError",
            Self::MemoryLimitExceeded => "MemoryLimitExceeded",
            Self::TimeLimitExceeded => "TimeLimitExceeded",
            Self::SystemError => "SystemError",
            Self::CompilationError => "CompilationError",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        use Verdict::*;
        assert!(CompilationError.severity() > SystemError.severity());
        assert!(SystemError.severity() > TimeLimitExceeded.severity());
        assert!(TimeLimitExceeded.severity() > MemoryLimitExceeded.severity());
        assert!(MemoryLimitExceeded.severity() > RuntimeError.severity());
        assert!(RuntimeError.severity() > PresentationError.severity());
        assert!(PresentationError.severity() > WrongAnswer.severity());
        assert!(WrongAnswer.severity() > Accepted.severity());
    }

    #[test]
    fn test_all_is_sorted_by_severity() {
        let severities: Vec<u8> = Verdict::ALL.iter().map(|v| v.severity()).collect();
        let mut sorted = severities.clone();
        sorted.sort_unstable();
        assert_eq!(severities, sorted);
    }

    #[test]
    fn test_status_mapping_is_final() {
        for verdict in Verdict::ALL {
            assert!(verdict.status().is_final());
            assert_eq!(verdict.is_accepted(), verdict.status().is_accepted());
        }
    }

    #[test]
    fn test_serde_matches_status_spelling() {
        for verdict in Verdict::ALL {
            let json = serde_json::to_string(verdict).unwrap();
            assert_eq!(json, format!("\"{}\"", verdict.status()));
        }
    }
}
