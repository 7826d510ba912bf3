use crate::error::{JudgeError, Result};
use crate::orchestrator::{JudgeOptions, judge_submission};
use crate::store::{StoreError, SubmissionStore, TestCaseStore};
use common::SubmissionStatus;
use common::config::JudgeConfig;
use common::submission::TerminalUpdate;
use executor::Runner;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Drives one submission from `Queued` to a final status.
///
/// Failures of the judge itself never escape: every path out of [`process`]
/// ends in a terminal store write, so a dequeued submission cannot stay
/// `Running` because of an error.
///
/// [`process`]: SubmissionProcessor::process
pub struct SubmissionProcessor {
    runner: Arc<dyn Runner>,
    submissions: Arc<dyn SubmissionStore>,
    test_cases: Arc<dyn TestCaseStore>,
    options: JudgeOptions,
}

impl SubmissionProcessor {
    pub fn new(
        runner: Arc<dyn Runner>,
        submissions: Arc<dyn SubmissionStore>,
        test_cases: Arc<dyn TestCaseStore>,
        options: JudgeOptions,
    ) -> Self {
        Self {
            runner,
            submissions,
            test_cases,
            options,
        }
    }

    #[instrument(skip(self))]
    pub async fn process(&self, submission_id: i32) {
        let job_id = Uuid::new_v4().to_string();
        if let Err(judge_error) = self.try_process(submission_id, &job_id).await {
            if let JudgeError::Store(StoreError::InvalidTransition { .. }) = judge_error {
                // The store refused our status write, meaning another writer
                // owns this submission. Leave the row alone.
                warn!(
                    submission_id,
                    job_id,
                    error = %judge_error,
                    "lost a status race, skipping"
                );
                return;
            }
            error!(
                submission_id,
                job_id,
                error = %judge_error,
                "judging failed, recording SystemError"
            );
            let update = TerminalUpdate::system_error(format!("judging failed: {judge_error}"));
            if let Err(store_error) = self.submissions.finish(submission_id, update).await {
                // Sole remaining channel is the log; the store write that
                // would tell the user already failed.
                error!(
                    submission_id,
                    job_id,
                    error = %store_error,
                    "could not record SystemError status"
                );
            }
        }
    }

    async fn try_process(&self, submission_id: i32, job_id: &str) -> Result<()> {
        let Some(submission) = self.submissions.get(submission_id).await? else {
            warn!(submission_id, "submission vanished before judging, skipping");
            return Ok(());
        };
        if submission.status != SubmissionStatus::Queued {
            warn!(
                submission_id,
                status = %submission.status,
                "submission is not queued, skipping"
            );
            return Ok(());
        }

        let test_cases = self.test_cases.for_problem(submission.problem_id).await?;
        if test_cases.is_empty() {
            warn!(
                submission_id,
                problem_id = submission.problem_id,
                "problem has no test cases"
            );
            self.submissions
                .finish(
                    submission_id,
                    TerminalUpdate::system_error("problem has no test cases"),
                )
                .await?;
            return Ok(());
        }

        self.submissions.mark_running(submission_id).await?;

        let report = judge_submission(
            self.runner.as_ref(),
            job_id,
            &submission,
            &test_cases,
            &self.options,
        )
        .await?;

        info!(
            submission_id,
            job_id,
            status = %report.status,
            score = report.score,
            execution_time_ms = report.execution_time_ms,
            "submission judged"
        );
        self.submissions
            .finish(submission_id, report.terminal_update())
            .await?;
        Ok(())
    }
}

/// What happened to a submission at admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Buffered; a pool worker will judge it.
    Queued,
    /// The queue was full or closed, so the caller's own task judged the
    /// submission before `submit` returned.
    RanInline,
}

/// Bounded worker pool consuming submission ids from a bounded queue.
///
/// Each worker judges one submission at a time, start to finish; test cases
/// of different submissions interleave only across workers, never within
/// one.
pub struct JudgePool {
    sender: mpsc::Sender<i32>,
    workers: Vec<JoinHandle<()>>,
    processor: Arc<SubmissionProcessor>,
}

impl JudgePool {
    pub fn start(config: &JudgeConfig, processor: Arc<SubmissionProcessor>) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..config.workers.max(1))
            .map(|worker_id| {
                let receiver = Arc::clone(&receiver);
                let processor = Arc::clone(&processor);
                tokio::spawn(async move {
                    loop {
                        let next = {
                            let mut receiver = receiver.lock().await;
                            receiver.recv().await
                        };
                        let Some(submission_id) = next else {
                            break;
                        };
                        debug!(worker_id, submission_id, "picked up submission");
                        processor.process(submission_id).await;
                    }
                    debug!(worker_id, "judge worker stopped");
                })
            })
            .collect();

        info!(
            workers = config.workers.max(1),
            queue_capacity = config.queue_capacity.max(1),
            "judge pool started"
        );
        Self {
            sender,
            workers,
            processor,
        }
    }

    /// Admits a submission for judging.
    ///
    /// Returns immediately with [`Admission::Queued`] while the queue has
    /// room. A saturated pool pushes the work onto the caller instead of
    /// dropping it: the submission is judged inline and the call returns
    /// [`Admission::RanInline`] once it reached a final status.
    pub async fn submit(&self, submission_id: i32) -> Admission {
        match self.sender.try_send(submission_id) {
            Ok(()) => Admission::Queued,
            Err(TrySendError::Full(submission_id)) => {
                warn!(submission_id, "judge queue saturated, running on the caller");
                self.processor.process(submission_id).await;
                Admission::RanInline
            }
            Err(TrySendError::Closed(submission_id)) => {
                warn!(submission_id, "judge pool shut down, running on the caller");
                self.processor.process(submission_id).await;
                Admission::RanInline
            }
        }
    }

    /// Closes admission, then waits for the workers to drain what is already
    /// queued.
    pub async fn shutdown(self) {
        drop(self.sender);
        for joined in futures::future::join_all(self.workers).await {
            if let Err(join_error) = joined {
                error!(error = %join_error, "judge worker panicked");
            }
        }
        info!("judge pool stopped");
    }
}
