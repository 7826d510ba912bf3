use crate::error::Result;
use crate::evaluator::{OutputComparison, evaluate};
use common::Verdict;
use common::config::AppConfig;
use common::report::{JudgeReport, TestCaseReport};
use common::submission::Submission;
use common::test_case::TestCase;
use executor::{ResourceLimits, Runner};
use tracing::{debug, instrument};

/// Knobs of one judging run.
#[derive(Debug, Clone, Copy)]
pub struct JudgeOptions {
    pub limits: ResourceLimits,
    pub comparison: OutputComparison,
    /// Score awarded when every test case passes; anything else scores 0.
    pub max_score: i32,
}

impl From<&AppConfig> for JudgeOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            limits: ResourceLimits::from(&config.executor),
            comparison: OutputComparison::default(),
            max_score: config.judge.max_score,
        }
    }
}

/// Judges one submission: runs its test cases in stored order and folds the
/// per-case verdicts into one report.
///
/// Every case runs even after a failure, so the report carries full
/// diagnostics. The exception is a first-case `CompilationError` or
/// `SystemError`: the program compiles once per submission, so that outcome
/// dooms every later case and the rest are skipped.
#[instrument(skip_all, fields(job_id = %job_id, submission_id = submission.id))]
pub async fn judge_submission(
    runner: &dyn Runner,
    job_id: &str,
    submission: &Submission,
    test_cases: &[TestCase],
    options: &JudgeOptions,
) -> Result<JudgeReport> {
    if test_cases.is_empty() {
        return Ok(JudgeReport::system_error(
            job_id,
            submission.id,
            "problem has no test cases",
        ));
    }

    let mut reports: Vec<TestCaseReport> = Vec::with_capacity(test_cases.len());
    let mut overall = Verdict::Accepted;
    let mut compile_output = None;

    for (index, test_case) in test_cases.iter().enumerate() {
        let report = evaluate(
            runner,
            &submission.source_code,
            submission.language,
            test_case,
            options.limits,
            options.comparison,
        )
        .await?;

        debug!(
            test_case_id = test_case.id,
            verdict = %report.verdict,
            time_ms = ?report.time_ms,
            "test case evaluated"
        );

        if report.verdict.severity() > overall.severity() {
            overall = report.verdict;
        }
        if report.verdict == Verdict::CompilationError && compile_output.is_none() {
            compile_output = report.detail.clone();
        }

        let stop = index == 0
            && matches!(
                report.verdict,
                Verdict::CompilationError | Verdict::SystemError
            );
        reports.push(report);
        if stop {
            break;
        }
    }

    let execution_time_ms = reports.iter().filter_map(|report| report.time_ms).max();
    let memory_used_kb = reports.iter().filter_map(|report| report.memory_kb).max();
    let score = if overall.is_accepted() {
        options.max_score
    } else {
        0
    };
    let message = compose_message(&reports, test_cases);

    Ok(JudgeReport {
        job_id: job_id.to_string(),
        submission_id: submission.id,
        status: overall.status(),
        score,
        execution_time_ms,
        memory_used_kb,
        compile_output,
        message: Some(message),
        test_cases: reports,
    })
}

/// One result line for the user, about the first failing case in stored
/// order. Hidden cases keep their expected output out of it.
fn compose_message(reports: &[TestCaseReport], test_cases: &[TestCase]) -> String {
    let Some((index, failed)) = reports
        .iter()
        .enumerate()
        .find(|(_, report)| !report.passed)
    else {
        let plural = if reports.len() == 1 { "" } else { "s" };
        return format!("All {} test case{plural} passed", reports.len());
    };

    if failed.verdict == Verdict::CompilationError {
        return match &failed.detail {
            Some(log) => format!("Compilation error:\n{log}"),
            None => "Compilation error".to_string(),
        };
    }

    let hidden = test_cases.get(index).is_some_and(|case| case.hidden);
    match &failed.detail {
        Some(detail) if !hidden => {
            format!("Test case {}: {} ({detail})", index + 1, failed.verdict)
        }
        _ => format!("Test case {}: {}", index + 1, failed.verdict),
    }
}
