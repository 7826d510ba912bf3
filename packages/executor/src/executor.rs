use crate::error::{ExecutorError, Result};
use crate::report::{FailureKind, PhaseStatus, RunReport};
use crate::runners::RunnerSet;
use async_trait::async_trait;
use common::Language;
use common::config::ExecutorConfig;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Slack added on top of compile + run limits for the outer wall-clock guard
/// around the whole runner invocation.
pub const WALL_GRACE_SECS: u64 = 2;

/// Hard limits applied to one run.
#[derive(Debug, Clone, Copy)]
pub struct ResourceLimits {
    pub time_limit_secs: u64,
    pub memory_limit_mb: u64,
}

impl From<&ExecutorConfig> for ResourceLimits {
    fn from(config: &ExecutorConfig) -> Self {
        Self {
            time_limit_secs: config.time_limit_secs,
            memory_limit_mb: config.memory_limit_mb,
        }
    }
}

/// Outcome of one compile+run under limits.
///
/// `failure` is `None` when the program ran to completion; whether its output
/// is correct is the evaluator's question, not the executor's.
#[derive(Debug, Clone)]
pub struct Execution {
    /// Program stdout/stderr, truncated by the runner.
    pub stdout: String,
    pub failure: Option<FailureKind>,
    pub compile_time_ms: Option<i32>,
    pub run_time_ms: Option<i32>,
    /// The report protocol echoes limits, not usage, so this stays `None`
    /// for script runners; other [`Runner`] implementations may measure it.
    pub memory_kb: Option<i32>,
    /// Compiler diagnostics, populated when compilation failed.
    pub compile_output: Option<String>,
    pub exit_code: Option<i32>,
}

impl Execution {
    fn from_report(report: RunReport) -> Self {
        let failure = report.failure();
        let compile_failed = report
            .compilation
            .as_ref()
            .is_some_and(|c| c.status == PhaseStatus::CompilationError);

        let (stdout, compile_output) = if compile_failed {
            (String::new(), Some(report.program_output))
        } else {
            (report.program_output, None)
        };

        Self {
            stdout,
            failure,
            compile_time_ms: report
                .compilation
                .as_ref()
                .map(|c| (c.compile_time_secs * 1000.0) as i32),
            run_time_ms: report
                .execution
                .as_ref()
                .map(|e| (e.execution_time_secs * 1000.0) as i32),
            memory_kb: None,
            compile_output,
            exit_code: report.execution.as_ref().map(|e| e.exit_code),
        }
    }

    fn wall_timeout(elapsed: Duration) -> Self {
        Self {
            stdout: String::new(),
            failure: Some(FailureKind::TimeLimit),
            compile_time_ms: None,
            run_time_ms: Some(elapsed.as_millis() as i32),
            memory_kb: None,
            compile_output: None,
            exit_code: None,
        }
    }
}

/// One compile+run of untrusted code under hard limits.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(
        &self,
        language: Language,
        source_code: &str,
        stdin: &str,
        limits: ResourceLimits,
    ) -> Result<Execution>;
}

/// The reference [`Runner`]: invokes the per-language scripts and parses the
/// report they print.
///
/// Every invocation gets an exclusive working directory, never shared across
/// concurrent runs, deleted when the run finishes.
pub struct ScriptRunner {
    runners: RunnerSet,
    config: ExecutorConfig,
}

impl ScriptRunner {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            runners: RunnerSet::new(&config.runners_dir),
            config,
        }
    }

    /// Fail-fast check that every runner script is present and executable.
    pub fn verify(&self) -> Result<()> {
        self.runners.verify()
    }
}

#[async_trait]
impl Runner for ScriptRunner {
    async fn run(
        &self,
        language: Language,
        source_code: &str,
        stdin: &str,
        limits: ResourceLimits,
    ) -> Result<Execution> {
        let dir = tempfile::Builder::new().prefix("gavel-run-").tempdir()?;

        let source_path = dir.path().join(language.source_file_name());
        fs::write(&source_path, source_code).await?;
        let stdin_path = dir.path().join("input.txt");
        fs::write(&stdin_path, stdin).await?;

        let script = self.runners.script_for(language);
        let mut command = Command::new(&script);
        command
            .arg(&source_path)
            .arg(&stdin_path)
            .arg(limits.time_limit_secs.to_string())
            .arg(limits.memory_limit_mb.to_string())
            .env(
                "GAVEL_COMPILE_TIMEOUT",
                self.config.compile_time_limit_secs.to_string(),
            )
            .current_dir(dir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            language = %language,
            time_limit_secs = limits.time_limit_secs,
            memory_limit_mb = limits.memory_limit_mb,
            "spawning runner"
        );

        let started = Instant::now();
        let child = command.spawn().map_err(|source| ExecutorError::Spawn {
            language,
            source,
        })?;

        // The runner enforces the real limits; this outer guard only exists
        // so a wedged runner cannot occupy a worker forever. Dropping the
        // future kills the child.
        let deadline = Duration::from_secs(
            self.config.compile_time_limit_secs + limits.time_limit_secs + WALL_GRACE_SECS,
        );
        let output = match timeout(deadline, child.wait_with_output()).await {
            Ok(waited) => waited.map_err(|source| ExecutorError::Spawn { language, source })?,
            Err(_) => {
                warn!(language = %language, "runner exceeded wall-clock guard, killed");
                return Ok(Execution::wall_timeout(started.elapsed()));
            }
        };

        if !output.status.success() {
            // The script itself failed, as opposed to the judged program;
            // the report would be meaningless.
            return Err(ExecutorError::RunnerFailed {
                language,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let report = RunReport::parse(&text).map_err(|source| ExecutorError::Protocol {
            language,
            source,
        })?;

        let execution = Execution::from_report(report);
        debug!(
            language = %language,
            failure = ?execution.failure,
            exit_code = ?execution.exit_code,
            run_time_ms = ?execution.run_time_ms,
            "runner finished"
        );
        Ok(execution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MAX_OUTPUT_BYTES;

    #[test]
    fn test_execution_from_successful_report() {
        let text = "\
=== COMPILATION ===
SUCCESS
Compile Time: 0.50s
=== EXECUTION ===
SUCCESS
Exit Code: 0
Execution Time: 1.25s
=== PROGRAM OUTPUT ===
42
=== RESOURCE USAGE ===
Memory Limit: 256MB
Time Limit: 2s
";
        let execution = Execution::from_report(RunReport::parse(text).unwrap());
        assert_eq!(execution.failure, None);
        assert_eq!(execution.stdout, "42");
        assert_eq!(execution.compile_time_ms, Some(500));
        assert_eq!(execution.run_time_ms, Some(1250));
        assert_eq!(execution.exit_code, Some(0));
        assert!(execution.compile_output.is_none());
    }

    #[test]
    fn test_execution_from_compile_failure_moves_diagnostics() {
        let text = "\
=== COMPILATION ===
COMPILATION_ERROR
Compile Time: 0.20s
=== PROGRAM OUTPUT ===
main.c:1: error: expected declaration
=== RESOURCE USAGE ===
Memory Limit: 256MB
Time Limit: 2s
";
        let execution = Execution::from_report(RunReport::parse(text).unwrap());
        assert_eq!(execution.failure, Some(FailureKind::Compilation));
        assert!(execution.stdout.is_empty());
        assert!(
            execution
                .compile_output
                .as_deref()
                .unwrap()
                .contains("expected declaration")
        );
        assert!(execution.run_time_ms.is_none());
    }

    #[test]
    fn test_wall_timeout_execution() {
        let execution = Execution::wall_timeout(Duration::from_millis(4321));
        assert_eq!(execution.failure, Some(FailureKind::TimeLimit));
        assert_eq!(execution.run_time_ms, Some(4321));
        assert!(execution.stdout.len() <= MAX_OUTPUT_BYTES);
    }
}
