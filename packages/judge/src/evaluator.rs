use common::Verdict;
use common::report::TestCaseReport;
use common::test_case::TestCase;
use executor::{Execution, FailureKind, ResourceLimits, Runner};

/// How program output is matched against the expected answer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputComparison {
    /// Lines are compared after right-trimming, and trailing blank lines are
    /// ignored, so `"0 1\n"` and `"0 1"` are the same answer.
    #[default]
    Normalized,
    /// Byte-for-byte equality.
    Exact,
}

/// Runs one test case and grades the outcome.
///
/// Anything the judged program did wrong comes back as a verdict inside the
/// report; `Err` means the judge itself could not run the program.
pub async fn evaluate(
    runner: &dyn Runner,
    source_code: &str,
    language: common::Language,
    test_case: &TestCase,
    limits: ResourceLimits,
    comparison: OutputComparison,
) -> executor::Result<TestCaseReport> {
    let execution = runner
        .run(language, source_code, &test_case.input, limits)
        .await?;

    let (verdict, detail) = grade(&execution, &test_case.expected_output, comparison);

    Ok(TestCaseReport {
        test_case_id: test_case.id,
        verdict,
        passed: verdict.is_accepted(),
        time_ms: execution.run_time_ms,
        memory_kb: execution.memory_kb,
        observed_output: Some(execution.stdout),
        detail,
    })
}

fn grade(
    execution: &Execution,
    expected_output: &str,
    comparison: OutputComparison,
) -> (Verdict, Option<String>) {
    if let Some(failure) = execution.failure {
        let detail = match failure {
            FailureKind::Compilation => execution.compile_output.clone(),
            FailureKind::Runtime => execution
                .exit_code
                .and_then(FailureKind::describe_exit_code)
                .map(str::to_string),
            FailureKind::TimeLimit | FailureKind::MemoryLimit => None,
        };
        return (failure.verdict(), detail);
    }

    match first_mismatch(&execution.stdout, expected_output, comparison) {
        Some(mismatch) => (Verdict::WrongAnswer, Some(mismatch)),
        None => (Verdict::Accepted, None),
    }
}

/// Returns a description of the first difference, or `None` on a match.
fn first_mismatch(actual: &str, expected: &str, comparison: OutputComparison) -> Option<String> {
    match comparison {
        OutputComparison::Exact => {
            (actual != expected).then(|| "output differs from expected answer".to_string())
        }
        OutputComparison::Normalized => {
            let actual = normalize(actual);
            let expected = normalize(expected);

            for (index, (got, want)) in actual.iter().zip(expected.iter()).enumerate() {
                if got != want {
                    return Some(format!(
                        "line {}: expected '{want}', got '{got}'",
                        index + 1
                    ));
                }
            }
            if actual.len() < expected.len() {
                Some(format!(
                    "line {}: expected '{}', got end of output",
                    actual.len() + 1,
                    expected[actual.len()]
                ))
            } else if actual.len() > expected.len() {
                Some(format!(
                    "line {}: unexpected extra output '{}'",
                    expected.len() + 1,
                    actual[expected.len()]
                ))
            } else {
                None
            }
        }
    }
}

/// Lines with trailing whitespace removed, trailing blank lines dropped.
fn normalize(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().map(|line| line.trim_end()).collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}
