pub mod error;
pub mod executor;
pub mod report;
pub mod runners;

pub use error::{ExecutorError, Result};
pub use executor::{Execution, ResourceLimits, Runner, ScriptRunner, WALL_GRACE_SECS};
pub use report::{FailureKind, MAX_OUTPUT_BYTES, RunReport};
pub use runners::RunnerSet;
