use serde::{Deserialize, Serialize};

/// One (input, expected output) pair of a problem.
///
/// Read-only from the judge's perspective; fetched once per judging run, in
/// stored order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestCase {
    pub id: i32,
    pub problem_id: i32,
    pub input: String,
    pub expected_output: String,
    /// Hidden cases are judged exactly like visible ones; the flag only
    /// affects what the end user is shown.
    pub hidden: bool,
}

impl TestCase {
    pub fn new(
        id: i32,
        problem_id: i32,
        input: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            id,
            problem_id,
            input: input.into(),
            expected_output: expected_output.into(),
            hidden: false,
        }
    }
}
