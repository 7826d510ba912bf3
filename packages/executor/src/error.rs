use crate::report::ReportParseError;
use common::Language;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the executor itself. Anything the judged program did wrong is
/// a [`crate::report::FailureKind`] inside a successful result, never one of
/// these.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("no runner script for {language} at {}", path.display())]
    MissingRunner { language: Language, path: PathBuf },

    #[error("runner script for {language} at {} is not executable", path.display())]
    RunnerNotExecutable { language: Language, path: PathBuf },

    #[error("failed to prepare working directory: {0}")]
    Workspace(#[from] std::io::Error),

    #[error("failed to spawn runner for {language}: {source}")]
    Spawn {
        language: Language,
        #[source]
        source: std::io::Error,
    },

    #[error("runner for {language} exited with {code:?}: {stderr}")]
    RunnerFailed {
        language: Language,
        code: Option<i32>,
        stderr: String,
    },

    #[error("invalid report from {language} runner: {source}")]
    Protocol {
        language: Language,
        #[source]
        source: ReportParseError,
    },
}

pub type Result<T> = std::result::Result<T, ExecutorError>;
