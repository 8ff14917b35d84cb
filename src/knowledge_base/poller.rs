//! Waiting for an ingestion job to reach a terminal status.

use crate::config::Config;
use crate::knowledge_base::{IngestionJob, KnowledgeBaseApi, KnowledgeBaseError};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Coarse lifecycle of an ingestion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    /// Any status that is not terminal.
    InProgress,
    /// Job finished successfully.
    Complete,
    /// Job finished with an error.
    Failed,
}

impl JobPhase {
    /// Classify a status string reported by the knowledge-base service.
    pub fn from_status(status: &str) -> Self {
        match status {
            "COMPLETE" => Self::Complete,
            "FAILED" => Self::Failed,
            _ => Self::InProgress,
        }
    }
}

/// Interval and attempt budget for status polling.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Delay between two status lookups.
    pub interval: Duration,
    /// Upper bound on the number of lookups.
    pub max_attempts: u32,
}

impl PollPolicy {
    /// Read the polling policy from runtime configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.poll_interval,
            max_attempts: config.poll_max_attempts,
        }
    }
}

/// Reasons polling stopped without a completed job.
#[derive(Debug, Error)]
pub enum PollError {
    /// The job reached the failed terminal status.
    #[error("Ingestion job {job_id} failed with status: {status}")]
    JobFailed {
        /// Job that failed.
        job_id: String,
        /// Terminal status reported by the service.
        status: String,
    },
    /// The attempt budget ran out before the job finished.
    #[error("Ingestion job {job_id} still {last_status} after {attempts} status checks")]
    AttemptsExhausted {
        /// Job being polled.
        job_id: String,
        /// Number of lookups performed.
        attempts: u32,
        /// Last status observed.
        last_status: String,
    },
    /// Polling was cancelled by the caller.
    #[error("Polling of ingestion job {job_id} was cancelled")]
    Cancelled {
        /// Job being polled.
        job_id: String,
    },
    /// A status lookup failed.
    #[error(transparent)]
    Lookup(#[from] KnowledgeBaseError),
}

/// Look up the job status until it is terminal, sleeping `policy.interval` between lookups.
///
/// Returns the completed job. Lookup failures are not retried.
pub async fn poll_until_terminal<S>(
    api: &S,
    job_id: &str,
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> Result<IngestionJob, PollError>
where
    S: KnowledgeBaseApi + ?Sized,
{
    let cancelled = || PollError::Cancelled {
        job_id: job_id.to_string(),
    };
    let mut attempts = 0u32;

    loop {
        let job = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(cancelled()),
            result = api.ingestion_status(job_id) => result?,
        };
        attempts += 1;
        tracing::info!(job_id, status = %job.status, attempts, "Ingestion job status");

        match JobPhase::from_status(&job.status) {
            JobPhase::Complete => {
                tracing::info!(job_id, "Ingestion job completed successfully");
                return Ok(job);
            }
            JobPhase::Failed => {
                return Err(PollError::JobFailed {
                    job_id: job_id.to_string(),
                    status: job.status,
                });
            }
            JobPhase::InProgress if attempts >= policy.max_attempts => {
                return Err(PollError::AttemptsExhausted {
                    job_id: job_id.to_string(),
                    attempts,
                    last_status: job.status,
                });
            }
            JobPhase::InProgress => {}
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(cancelled()),
            () = tokio::time::sleep(policy.interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{JobPhase, PollError, PollPolicy, poll_until_terminal};
    use crate::knowledge_base::{
        IngestionJob, KnowledgeBaseApi, KnowledgeBaseError, UploadOutcome,
    };
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    const INTERVAL: Duration = Duration::from_secs(10);
    // Timer wheel granularity under a paused clock.
    const TICK: Duration = Duration::from_millis(2);

    fn assert_about_interval(delay: Duration) {
        assert!(
            delay >= INTERVAL && delay < INTERVAL + TICK,
            "unexpected delay between lookups: {delay:?}"
        );
    }

    struct ScriptedStatuses {
        statuses: Mutex<VecDeque<&'static str>>,
        lookups: Mutex<Vec<Instant>>,
    }

    impl ScriptedStatuses {
        fn new(statuses: &[&'static str]) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                lookups: Mutex::new(Vec::new()),
            }
        }

        async fn lookup_times(&self) -> Vec<Instant> {
            self.lookups.lock().await.clone()
        }
    }

    #[async_trait]
    impl KnowledgeBaseApi for ScriptedStatuses {
        async fn upload_document(
            &self,
            _filename: &str,
            _content: Bytes,
        ) -> Result<UploadOutcome, KnowledgeBaseError> {
            unreachable!("polling never uploads")
        }

        async fn start_ingestion(&self) -> Result<IngestionJob, KnowledgeBaseError> {
            unreachable!("polling never starts jobs")
        }

        async fn ingestion_status(
            &self,
            job_id: &str,
        ) -> Result<IngestionJob, KnowledgeBaseError> {
            self.lookups.lock().await.push(Instant::now());
            let status = self
                .statuses
                .lock()
                .await
                .pop_front()
                .expect("poller looked up more statuses than scripted");
            Ok(IngestionJob {
                ingestion_job_id: job_id.to_string(),
                status: status.to_string(),
            })
        }

        async fn query(&self, _text: &str) -> Result<String, KnowledgeBaseError> {
            unreachable!("polling never queries")
        }
    }

    fn policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: INTERVAL,
            max_attempts,
        }
    }

    #[test]
    fn only_complete_and_failed_are_terminal() {
        assert_eq!(JobPhase::from_status("COMPLETE"), JobPhase::Complete);
        assert_eq!(JobPhase::from_status("FAILED"), JobPhase::Failed);
        for status in ["STARTING", "IN_PROGRESS", "STOPPING", "complete", ""] {
            assert_eq!(JobPhase::from_status(status), JobPhase::InProgress);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_complete_with_fixed_delays() {
        let api = ScriptedStatuses::new(&["STARTING", "IN_PROGRESS", "COMPLETE"]);
        let started = Instant::now();

        let job = poll_until_terminal(&api, "job-1", policy(10), &CancellationToken::new())
            .await
            .expect("job completes");

        assert_eq!(job.status, "COMPLETE");
        let lookups = api.lookup_times().await;
        assert_eq!(lookups.len(), 3);
        assert!(lookups[0] - started < TICK);
        assert_about_interval(lookups[1] - lookups[0]);
        assert_about_interval(lookups[2] - lookups[1]);
        assert!(started.elapsed() < INTERVAL * 2 + TICK * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_is_an_error_and_ends_polling() {
        let api = ScriptedStatuses::new(&["IN_PROGRESS", "FAILED", "COMPLETE"]);

        let err = poll_until_terminal(&api, "job-2", policy(10), &CancellationToken::new())
            .await
            .expect_err("job fails");

        match err {
            PollError::JobFailed { job_id, status } => {
                assert_eq!(job_id, "job-2");
                assert_eq!(status, "FAILED");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(api.lookup_times().await.len(), 2);
        assert_eq!(api.statuses.lock().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_attempt_budget() {
        let api = ScriptedStatuses::new(&["STARTING", "IN_PROGRESS", "IN_PROGRESS", "COMPLETE"]);

        let err = poll_until_terminal(&api, "job-3", policy(3), &CancellationToken::new())
            .await
            .expect_err("budget exhausted");

        assert!(matches!(
            err,
            PollError::AttemptsExhausted { attempts: 3, ref last_status, .. } if last_status == "IN_PROGRESS"
        ));
        assert_eq!(api.lookup_times().await.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_wait() {
        let api = ScriptedStatuses::new(&["STARTING", "IN_PROGRESS"]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(INTERVAL / 2).await;
            trigger.cancel();
        });

        let err = poll_until_terminal(&api, "job-4", policy(10), &cancel)
            .await
            .expect_err("cancelled");

        assert!(matches!(err, PollError::Cancelled { .. }));
        assert_eq!(api.lookup_times().await.len(), 1);
    }
}
