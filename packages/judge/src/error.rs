use thiserror::Error;

use crate::store::StoreError;
use executor::ExecutorError;

/// Infrastructure failures inside the judging pipeline. Domain outcomes
/// (wrong answer, time limit, ...) are verdicts, never errors; anything
/// surfacing here ends the submission in `SystemError`.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),
}

pub type Result<T> = std::result::Result<T, JudgeError>;
