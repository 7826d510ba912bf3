//! The textual report every runner script prints on stdout.
//!
//! The report is parsed instead of relying solely on the child's exit code:
//! a SIGKILL at the deadline and a SIGKILL from the OOM killer share exit
//! code 137, and only the runner (which observed the wall clock and the
//! program's output) can tell them apart in its printed status.

use common::Verdict;
use std::collections::HashMap;
use thiserror::Error;

/// Program output is never reported beyond this many bytes.
pub const MAX_OUTPUT_BYTES: usize = 4096;

/// Status token a runner prints for the compile or execution phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseStatus {
    Success,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
    CompilationError,
}

impl PhaseStatus {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "SUCCESS" => Some(Self::Success),
            "TIME_LIMIT_EXCEEDED" => Some(Self::TimeLimitExceeded),
            "MEMORY_LIMIT_EXCEEDED" => Some(Self::MemoryLimitExceeded),
            "RUNTIME_ERROR" => Some(Self::RuntimeError),
            "COMPILATION_ERROR" => Some(Self::CompilationError),
            _ => None,
        }
    }
}

/// How one run failed, before any output comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    TimeLimit,
    MemoryLimit,
    Runtime,
    Compilation,
}

impl FailureKind {
    /// Classifies a child exit code: 124 is the `timeout(1)` exit, 137 is
    /// SIGKILL, 139/134/136 are segfault/abort/FP-error, and any other
    /// non-zero exit is a plain runtime error. Used as a fallback when the
    /// printed status and the exit code disagree.
    pub fn from_exit_code(code: i32) -> Option<Self> {
        match code {
            0 => None,
            124 => Some(Self::TimeLimit),
            137 => Some(Self::MemoryLimit),
            _ => Some(Self::Runtime),
        }
    }

    /// Human-readable note for the runtime-error subclasses.
    pub fn describe_exit_code(code: i32) -> Option<&'static str> {
        match code {
            139 => Some("segmentation fault"),
            134 => Some("aborted"),
            136 => Some("floating point exception"),
            _ => None,
        }
    }

    pub fn verdict(&self) -> Verdict {
        match self {
            Self::TimeLimit => Verdict::TimeLimitExceeded,
            Self::MemoryLimit => Verdict::MemoryLimitExceeded,
            Self::Runtime => Verdict::RuntimeError,
            Self::Compilation => Verdict::CompilationError,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompilationSection {
    pub status: PhaseStatus,
    pub compile_time_secs: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionSection {
    pub status: PhaseStatus,
    pub exit_code: i32,
    pub execution_time_secs: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResourceSection {
    pub memory_limit_mb: u64,
    pub time_limit_secs: u64,
}

/// Error when a runner's stdout is not a well-formed report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportParseError {
    #[error("report is missing the {0} section")]
    MissingSection(&'static str),

    #[error("unknown status token '{0}'")]
    UnknownStatus(String),

    #[error("malformed field line '{0}'")]
    MalformedField(String),
}

/// Parsed form of the report a runner prints.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    /// Compile phase; `None` for interpreted languages.
    pub compilation: Option<CompilationSection>,
    /// Run phase; `None` when compilation failed and nothing was executed.
    pub execution: Option<ExecutionSection>,
    /// Program stdout/stderr, truncated to [`MAX_OUTPUT_BYTES`]. Holds the
    /// compiler diagnostics instead when compilation failed.
    pub program_output: String,
    pub resource_usage: Option<ResourceSection>,
}

const COMPILATION_HEADER: &str = "=== COMPILATION ===";
const EXECUTION_HEADER: &str = "=== EXECUTION ===";
const PROGRAM_OUTPUT_HEADER: &str = "=== PROGRAM OUTPUT ===";
const RESOURCE_USAGE_HEADER: &str = "=== RESOURCE USAGE ===";

const HEADERS: &[&str] = &[
    COMPILATION_HEADER,
    EXECUTION_HEADER,
    PROGRAM_OUTPUT_HEADER,
    RESOURCE_USAGE_HEADER,
];

impl RunReport {
    pub fn parse(text: &str) -> Result<Self, ReportParseError> {
        let mut sections: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut current: Option<&str> = None;

        for line in text.lines() {
            if let Some(header) = HEADERS.iter().find(|h| **h == line.trim_end()) {
                current = Some(header);
                sections.entry(header).or_default();
            } else if let Some(header) = current
                && let Some(lines) = sections.get_mut(header)
            {
                lines.push(line);
            }
        }

        let compilation = match sections.get(COMPILATION_HEADER) {
            Some(lines) => Some(parse_compilation(lines)?),
            None => None,
        };

        let execution = match sections.get(EXECUTION_HEADER) {
            Some(lines) => Some(parse_execution(lines)?),
            None => None,
        };

        // A report without an execution section is only valid when the
        // compile phase already failed.
        let compile_failed = compilation
            .as_ref()
            .is_some_and(|c| c.status == PhaseStatus::CompilationError);
        if execution.is_none() && !compile_failed {
            return Err(ReportParseError::MissingSection("EXECUTION"));
        }

        let program_output = sections
            .get(PROGRAM_OUTPUT_HEADER)
            .map(|lines| truncate_output(&lines.join("\n")))
            .unwrap_or_default();

        let resource_usage = match sections.get(RESOURCE_USAGE_HEADER) {
            Some(lines) => parse_resource_usage(lines),
            None => None,
        };

        Ok(Self {
            compilation,
            execution,
            program_output,
            resource_usage,
        })
    }

    /// Classifies the whole report. The printed status wins; the exit code
    /// is only consulted when the runner claims success despite a non-zero
    /// exit.
    pub fn failure(&self) -> Option<FailureKind> {
        if let Some(compilation) = &self.compilation
            && compilation.status == PhaseStatus::CompilationError
        {
            return Some(FailureKind::Compilation);
        }

        let execution = self.execution.as_ref()?;
        match execution.status {
            PhaseStatus::Success => FailureKind::from_exit_code(execution.exit_code),
            PhaseStatus::TimeLimitExceeded => Some(FailureKind::TimeLimit),
            PhaseStatus::MemoryLimitExceeded => Some(FailureKind::MemoryLimit),
            PhaseStatus::RuntimeError => Some(FailureKind::Runtime),
            PhaseStatus::CompilationError => Some(FailureKind::Compilation),
        }
    }
}

fn parse_compilation(lines: &[&str]) -> Result<CompilationSection, ReportParseError> {
    let status = parse_status_line(lines)?;
    let compile_time_secs = parse_seconds_field(lines, "Compile Time").unwrap_or(0.0);
    Ok(CompilationSection {
        status,
        compile_time_secs,
    })
}

fn parse_execution(lines: &[&str]) -> Result<ExecutionSection, ReportParseError> {
    let status = parse_status_line(lines)?;
    let exit_code = parse_field(lines, "Exit Code")
        .ok_or_else(|| ReportParseError::MalformedField("Exit Code".into()))?
        .parse::<i32>()
        .map_err(|_| ReportParseError::MalformedField("Exit Code".into()))?;
    let execution_time_secs = parse_seconds_field(lines, "Execution Time").unwrap_or(0.0);
    Ok(ExecutionSection {
        status,
        exit_code,
        execution_time_secs,
    })
}

fn parse_resource_usage(lines: &[&str]) -> Option<ResourceSection> {
    let memory_limit_mb = parse_field(lines, "Memory Limit")?
        .trim_end_matches("MB")
        .parse::<u64>()
        .ok()?;
    let time_limit_secs = parse_field(lines, "Time Limit")?
        .trim_end_matches('s')
        .parse::<u64>()
        .ok()?;
    Some(ResourceSection {
        memory_limit_mb,
        time_limit_secs,
    })
}

fn parse_status_line(lines: &[&str]) -> Result<PhaseStatus, ReportParseError> {
    let token = lines
        .iter()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .ok_or(ReportParseError::MissingSection("status"))?;
    PhaseStatus::parse(token).ok_or_else(|| ReportParseError::UnknownStatus(token.to_string()))
}

fn parse_field<'a>(lines: &[&'a str], key: &str) -> Option<&'a str> {
    lines.iter().find_map(|line| {
        let (k, v) = line.split_once(':')?;
        (k.trim() == key).then_some(v.trim())
    })
}

fn parse_seconds_field(lines: &[&str], key: &str) -> Option<f64> {
    parse_field(lines, key)?
        .trim_end_matches('s')
        .parse::<f64>()
        .ok()
}

/// Caps `output` at [`MAX_OUTPUT_BYTES`], respecting UTF-8 boundaries.
pub fn truncate_output(output: &str) -> String {
    if output.len() <= MAX_OUTPUT_BYTES {
        return output.to_string();
    }
    let mut end = MAX_OUTPUT_BYTES;
    while !output.is_char_boundary(end) {
        end -= 1;
    }
    output[..end].to_string()
}
