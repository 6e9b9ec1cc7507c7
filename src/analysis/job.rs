// src/analysis/job.rs
//! Asynchronous job lifecycle for the upload-and-poll analysis path.
//!
//! State machine: submitted → processing → {ready | failed | timed_out}.
//! The uploaded remote artifact is deleted exactly once on every exit path;
//! deletion failures are logged, never escalated.

use std::future::Future;
use std::time::Duration;

use metrics::counter;

use crate::config::{DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_MAX_ATTEMPTS};
use crate::error::PipelineError;

use super::backend::{AnalysisBackend, RemoteFileState};
use super::DocumentUpload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Processing,
    Ready,
    Failed,
    TimedOut,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

/// One step of a status probe.
pub enum PollStep<T> {
    Pending,
    Done(T),
    Failed(String),
}

/// Terminal result of a bounded polling run.
#[derive(Debug, PartialEq)]
pub enum PollOutcome<T> {
    Done(T),
    Failed(String),
    Exhausted { attempts: u32, elapsed: Duration },
}

/// Bounded fixed-interval retry: the general shape for any
/// asynchronous-job integration. Polling latency is bounded by
/// `interval * max_attempts`.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    /// Probe until done/failed or the attempt budget runs out. A probe
    /// transport error counts as still-pending; the budget is the backstop.
    pub async fn run<T, F, Fut>(&self, mut probe: F) -> PollOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = anyhow::Result<PollStep<T>>>,
    {
        let started = tokio::time::Instant::now();
        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.interval).await;
            match probe(attempt).await {
                Ok(PollStep::Done(v)) => return PollOutcome::Done(v),
                Ok(PollStep::Failed(reason)) => return PollOutcome::Failed(reason),
                Ok(PollStep::Pending) => {}
                Err(e) => {
                    tracing::warn!(attempt, error = ?e, "status probe error, treating as pending");
                }
            }
        }
        PollOutcome::Exhausted {
            attempts: self.max_attempts,
            elapsed: started.elapsed(),
        }
    }
}

/// Run one document through the asynchronous path: upload, poll to a
/// terminal state, generate against the uploaded reference, clean up.
pub(crate) async fn run_document_job(
    backend: &dyn AnalysisBackend,
    policy: &PollPolicy,
    upload: &DocumentUpload,
    prompt: &str,
) -> Result<String, PipelineError> {
    counter!("analysis_jobs_total").increment(1);
    let started = std::time::Instant::now();

    let file = backend
        .upload(&upload.file_name, &upload.mime_type, &upload.bytes)
        .await
        .map_err(|e| PipelineError::AnalysisFailed {
            reason: format!("upload: {e:#}"),
        })?;

    tracing::info!(
        file = %file.name,
        bytes = upload.bytes.len(),
        state = JobState::Processing.as_str(),
        "analysis job submitted"
    );

    let file_ref = &file;
    let outcome = policy
        .run(move |attempt| async move {
            counter!("analysis_polls_total").increment(1);
            tracing::debug!(file = %file_ref.name, attempt, "polling job state");
            Ok(match backend.file_state(file_ref).await? {
                RemoteFileState::Active => PollStep::Done(()),
                RemoteFileState::Failed => {
                    PollStep::Failed("remote reported processing failure".to_string())
                }
                RemoteFileState::Processing => PollStep::Pending,
            })
        })
        .await;

    let result: Result<String, PipelineError> = match outcome {
        PollOutcome::Done(()) => {
            tracing::info!(
                file = %file.name,
                state = JobState::Ready.as_str(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "analysis job ready"
            );
            counter!("analysis_jobs_ready_total").increment(1);
            backend
                .generate_with_file(&file, prompt)
                .await
                .map_err(|e| PipelineError::AnalysisFailed {
                    reason: format!("generation: {e:#}"),
                })
        }
        PollOutcome::Failed(reason) => {
            counter!("analysis_jobs_failed_total").increment(1);
            tracing::warn!(file = %file.name, state = JobState::Failed.as_str(), %reason, "analysis job failed");
            Err(PipelineError::AnalysisFailed { reason })
        }
        PollOutcome::Exhausted { attempts, elapsed } => {
            counter!("analysis_jobs_timeout_total").increment(1);
            tracing::warn!(
                file = %file.name,
                state = JobState::TimedOut.as_str(),
                attempts,
                elapsed_secs = elapsed.as_secs(),
                "analysis polling budget exhausted"
            );
            Err(PipelineError::AnalysisTimedOut {
                attempts,
                elapsed_secs: elapsed.as_secs(),
            })
        }
    };

    // Best-effort cleanup, exactly once, regardless of how the job ended.
    if let Err(e) = backend.delete_file(&file).await {
        tracing::warn!(file = %file.name, error = ?e, "remote artifact cleanup failed");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn poll_policy_returns_done_when_probe_succeeds() {
        let policy = PollPolicy {
            interval: Duration::from_secs(5),
            max_attempts: 12,
        };
        let calls = AtomicU32::new(0);
        let outcome = policy
            .run(|_| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    Ok(if n < 3 {
                        PollStep::Pending
                    } else {
                        PollStep::Done(n)
                    })
                }
            })
            .await;
        assert_eq!(outcome, PollOutcome::Done(3));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_policy_exhausts_after_max_attempts() {
        let policy = PollPolicy {
            interval: Duration::from_secs(5),
            max_attempts: 4,
        };
        let outcome: PollOutcome<()> = policy.run(|_| async { Ok(PollStep::Pending) }).await;
        match outcome {
            PollOutcome::Exhausted { attempts, elapsed } => {
                assert_eq!(attempts, 4);
                assert!(elapsed >= Duration::from_secs(20));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn probe_errors_count_as_pending() {
        let policy = PollPolicy {
            interval: Duration::from_secs(1),
            max_attempts: 3,
        };
        let calls = AtomicU32::new(0);
        let outcome = policy
            .run(|_| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == 1 {
                        Err(anyhow::anyhow!("transient"))
                    } else {
                        Ok(PollStep::Done(n))
                    }
                }
            })
            .await;
        assert_eq!(outcome, PollOutcome::Done(2));
    }

    #[tokio::test(start_paused = true)]
    async fn remote_failure_is_terminal() {
        let policy = PollPolicy {
            interval: Duration::from_secs(5),
            max_attempts: 12,
        };
        let outcome: PollOutcome<()> = policy
            .run(|_| async { Ok(PollStep::Failed("boom".to_string())) })
            .await;
        assert_eq!(outcome, PollOutcome::Failed("boom".to_string()));
    }
}
