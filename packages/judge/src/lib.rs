pub mod error;
pub mod evaluator;
pub mod orchestrator;
pub mod processor;
pub mod store;

pub use error::{JudgeError, Result};
pub use evaluator::OutputComparison;
pub use orchestrator::{JudgeOptions, judge_submission};
pub use processor::{Admission, JudgePool, SubmissionProcessor};
pub use store::{MemoryStore, StoreError, SubmissionStore, TestCaseStore};
