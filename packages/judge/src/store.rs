use async_trait::async_trait;
use common::SubmissionStatus;
use common::submission::{Submission, TerminalUpdate};
use common::test_case::TestCase;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("submission {0} not found")]
    NotFound(i32),

    #[error("submission {id} already exists")]
    AlreadyExists { id: i32 },

    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition {
        from: SubmissionStatus,
        to: SubmissionStatus,
    },

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Submission persistence as the judge sees it.
///
/// Implementations enforce the status machine: `mark_running` and `finish`
/// reject writes the current status does not allow, which is what makes final
/// statuses absorbing even with concurrent judging attempts.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn get(&self, id: i32) -> Result<Option<Submission>>;

    async fn create(&self, submission: Submission) -> Result<()>;

    async fn mark_running(&self, id: i32) -> Result<()>;

    /// Applies status, score, metrics and result in one atomic write.
    async fn finish(&self, id: i32, update: TerminalUpdate) -> Result<()>;
}

#[async_trait]
pub trait TestCaseStore: Send + Sync {
    /// Test cases of a problem, in stored order.
    async fn for_problem(&self, problem_id: i32) -> Result<Vec<TestCase>>;
}

/// In-memory store backing the CLI and the tests.
///
/// One `RwLock` per table; a status check and the write it guards always
/// happen under the same lock guard.
#[derive(Default)]
pub struct MemoryStore {
    submissions: RwLock<HashMap<i32, Submission>>,
    test_cases: RwLock<Vec<TestCase>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_test_case(&self, test_case: TestCase) {
        self.test_cases.write().await.push(test_case);
    }

    pub async fn add_test_cases(&self, cases: impl IntoIterator<Item = TestCase>) {
        self.test_cases.write().await.extend(cases);
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn get(&self, id: i32) -> Result<Option<Submission>> {
        Ok(self.submissions.read().await.get(&id).cloned())
    }

    async fn create(&self, submission: Submission) -> Result<()> {
        let mut submissions = self.submissions.write().await;
        if submissions.contains_key(&submission.id) {
            return Err(StoreError::AlreadyExists { id: submission.id });
        }
        submissions.insert(submission.id, submission);
        Ok(())
    }

    async fn mark_running(&self, id: i32) -> Result<()> {
        let mut submissions = self.submissions.write().await;
        let submission = submissions.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if !submission
            .status
            .can_transition_to(SubmissionStatus::Running)
        {
            return Err(StoreError::InvalidTransition {
                from: submission.status,
                to: SubmissionStatus::Running,
            });
        }
        submission.status = SubmissionStatus::Running;
        Ok(())
    }

    async fn finish(&self, id: i32, update: TerminalUpdate) -> Result<()> {
        let mut submissions = self.submissions.write().await;
        let submission = submissions.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if !submission.status.can_transition_to(update.status) {
            return Err(StoreError::InvalidTransition {
                from: submission.status,
                to: update.status,
            });
        }
        submission.status = update.status;
        submission.score = update.score;
        submission.execution_time_ms = update.execution_time_ms;
        submission.memory_used_kb = update.memory_used_kb;
        submission.result = update.result;
        Ok(())
    }
}

#[async_trait]
impl TestCaseStore for MemoryStore {
    async fn for_problem(&self, problem_id: i32) -> Result<Vec<TestCase>> {
        Ok(self
            .test_cases
            .read()
            .await
            .iter()
            .filter(|case| case.problem_id == problem_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Language;

    fn queued_submission(id: i32) -> Submission {
        Submission::new(id, 10, 100, None, "print(1)", Language::Python).unwrap()
    }

    fn accepted_update() -> TerminalUpdate {
        TerminalUpdate {
            status: SubmissionStatus::Accepted,
            score: 100,
            execution_time_ms: Some(30),
            memory_used_kb: Some(1024),
            result: Some("All 3 test cases passed".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = MemoryStore::new();
        store.create(queued_submission(1)).await.unwrap();

        let submission = store.get(1).await.unwrap().unwrap();
        assert_eq!(submission.status, SubmissionStatus::Queued);
        assert!(store.get(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_is_rejected() {
        let store = MemoryStore::new();
        store.create(queued_submission(1)).await.unwrap();
        let err = store.create(queued_submission(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { id: 1 }));
    }

    #[tokio::test]
    async fn test_finish_applies_every_field_together() {
        let store = MemoryStore::new();
        store.create(queued_submission(1)).await.unwrap();
        store.mark_running(1).await.unwrap();
        store.finish(1, accepted_update()).await.unwrap();

        let submission = store.get(1).await.unwrap().unwrap();
        assert_eq!(submission.status, SubmissionStatus::Accepted);
        assert_eq!(submission.score, 100);
        assert_eq!(submission.execution_time_ms, Some(30));
        assert_eq!(submission.memory_used_kb, Some(1024));
        assert_eq!(
            submission.result.as_deref(),
            Some("All 3 test cases passed")
        );
    }

    #[tokio::test]
    async fn test_finish_is_rejected_once_final() {
        let store = MemoryStore::new();
        store.create(queued_submission(1)).await.unwrap();
        store.mark_running(1).await.unwrap();
        store.finish(1, accepted_update()).await.unwrap();

        let err = store
            .finish(1, TerminalUpdate::system_error("late failure"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTransition {
                from: SubmissionStatus::Accepted,
                to: SubmissionStatus::SystemError,
            }
        ));

        // The losing write changed nothing.
        let submission = store.get(1).await.unwrap().unwrap();
        assert_eq!(submission.score, 100);
    }

    #[tokio::test]
    async fn test_queued_submission_can_fail_without_running() {
        let store = MemoryStore::new();
        store.create(queued_submission(1)).await.unwrap();
        store
            .finish(1, TerminalUpdate::system_error("problem has no test cases"))
            .await
            .unwrap();

        let submission = store.get(1).await.unwrap().unwrap();
        assert_eq!(submission.status, SubmissionStatus::SystemError);
        assert_eq!(submission.score, 0);
    }

    #[tokio::test]
    async fn test_queued_submission_cannot_jump_to_accepted() {
        let store = MemoryStore::new();
        store.create(queued_submission(1)).await.unwrap();
        let err = store.finish(1, accepted_update()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_mark_running_on_missing_submission() {
        let store = MemoryStore::new();
        let err = store.mark_running(42).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(42)));
    }

    #[tokio::test]
    async fn test_test_cases_filtered_by_problem_in_order() {
        let store = MemoryStore::new();
        store
            .add_test_cases([
                TestCase::new(1, 100, "a", "1"),
                TestCase::new(2, 200, "b", "2"),
                TestCase::new(3, 100, "c", "3"),
            ])
            .await;

        let cases = store.for_problem(100).await.unwrap();
        let ids: Vec<i32> = cases.iter().map(|case| case.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
