//! The job record: identity, parameters, and guarded lifecycle state.

use super::status::JobStatus;
use crate::cancellation::CancellationToken;
use crate::errors::PipelineError;
use crate::state::{GenerationResult, JobParams};
use crate::utils::{generate_job_id, now, Timestamp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// One tracked execution instance of the pipeline.
///
/// The owning execution task is the single writer of the record; other
/// callers only read snapshots and set the cancellation flag. Terminal
/// transitions are monotonic: the first terminal write wins and later
/// attempts are ignored.
pub struct Job {
    id: Uuid,
    params: JobParams,
    record: RwLock<JobRecord>,
    cancel: Arc<CancellationToken>,
    task: RwLock<Option<JoinHandle<()>>>,
}

#[derive(Debug, Clone)]
struct JobRecord {
    status: JobStatus,
    created_at: Timestamp,
    started_at: Option<Timestamp>,
    completed_at: Option<Timestamp>,
    result: Option<GenerationResult>,
    error: Option<String>,
}

impl Job {
    /// Creates a queued job with a fresh identifier.
    #[must_use]
    pub(crate) fn new(params: JobParams) -> Self {
        Self {
            id: generate_job_id(),
            params,
            record: RwLock::new(JobRecord {
                status: JobStatus::Queued,
                created_at: now(),
                started_at: None,
                completed_at: None,
                result: None,
                error: None,
            }),
            cancel: Arc::new(CancellationToken::new()),
            task: RwLock::new(None),
        }
    }

    /// Returns the job id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the immutable creation parameters.
    #[must_use]
    pub fn params(&self) -> &JobParams {
        &self.params
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.record.read().status
    }

    /// Returns true if the job has reached a terminal status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.record.read().status.is_terminal()
    }

    /// Returns the job's cancellation token.
    #[must_use]
    pub fn cancel_token(&self) -> Arc<CancellationToken> {
        Arc::clone(&self.cancel)
    }

    /// Returns a point-in-time snapshot of the job's queryable state.
    ///
    /// Terminal snapshots are stable: repeated queries return identical
    /// payloads.
    #[must_use]
    pub fn snapshot(&self) -> JobSnapshot {
        let record = self.record.read();
        JobSnapshot {
            job_id: self.id,
            status: record.status,
            created_at: record.created_at,
            started_at: record.started_at,
            completed_at: record.completed_at,
            result: record.result.clone(),
            error: record.error.clone(),
        }
    }

    /// Queued → Running, recording `started_at`. Errors on a double start:
    /// exactly one execution task exists per job for its lifetime.
    pub(crate) fn mark_running(&self) -> Result<(), PipelineError> {
        let mut record = self.record.write();
        if record.status != JobStatus::Queued {
            return Err(PipelineError::Internal(format!(
                "job {} already started (status {})",
                self.id, record.status
            )));
        }
        record.status = JobStatus::Running;
        record.started_at = Some(now());
        Ok(())
    }

    /// Terminal write: Completed with a result.
    pub(crate) fn mark_completed(&self, result: GenerationResult) {
        let mut record = self.record.write();
        if record.status.is_terminal() {
            return;
        }
        record.status = JobStatus::Completed;
        record.result = Some(result);
        record.completed_at = Some(now());
    }

    /// Terminal write: Failed with the error message kept verbatim.
    pub(crate) fn mark_failed(&self, error: impl Into<String>) {
        let mut record = self.record.write();
        if record.status.is_terminal() {
            return;
        }
        record.status = JobStatus::Failed;
        record.error = Some(error.into());
        record.completed_at = Some(now());
    }

    /// Terminal write: Cancelled with the signal's reason.
    pub(crate) fn mark_cancelled(&self, reason: impl Into<String>) {
        let mut record = self.record.write();
        if record.status.is_terminal() {
            return;
        }
        record.status = JobStatus::Cancelled;
        record.error = Some(reason.into());
        record.completed_at = Some(now());
    }

    /// Stores the execution task handle.
    pub(crate) fn set_task(&self, handle: JoinHandle<()>) {
        *self.task.write() = Some(handle);
    }

    /// Takes the execution task handle for draining.
    pub(crate) fn take_task(&self) -> Option<JoinHandle<()>> {
        self.task.write().take()
    }

    /// Returns true if an execution task has been attached.
    #[must_use]
    pub fn has_execution_task(&self) -> bool {
        self.task.read().is_some()
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// The queryable state of a job at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// The job id.
    pub job_id: Uuid,
    /// Current status.
    pub status: JobStatus,
    /// Creation time.
    pub created_at: Timestamp,
    /// Start time, once started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    /// Terminal time, once terminal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    /// Success payload; set iff status is Completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,
    /// Failure reason; set iff status is Failed or Cancelled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SongState;
    use crate::PipelineConfig;
    use pretty_assertions::assert_eq;

    fn job() -> Job {
        Job::new(JobParams::new("req"))
    }

    fn result() -> GenerationResult {
        SongState::seeded(JobParams::new("req"), &PipelineConfig::default()).into_result()
    }

    #[test]
    fn test_new_job_is_queued() {
        let job = job();
        assert_eq!(job.status(), JobStatus::Queued);
        assert!(!job.is_terminal());
        assert!(!job.has_execution_task());
    }

    #[test]
    fn test_mark_running_records_start() {
        let job = job();
        job.mark_running().unwrap();
        assert_eq!(job.status(), JobStatus::Running);
        assert!(job.snapshot().started_at.is_some());
    }

    #[test]
    fn test_double_start_rejected() {
        let job = job();
        job.mark_running().unwrap();
        assert!(job.mark_running().is_err());
    }

    #[test]
    fn test_result_iff_completed() {
        let job = job();
        job.mark_running().unwrap();
        job.mark_completed(result());

        let snapshot = job.snapshot();
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert!(snapshot.result.is_some());
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn test_error_iff_failed() {
        let job = job();
        job.mark_running().unwrap();
        job.mark_failed("backend exploded");

        let snapshot = job.snapshot();
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("backend exploded"));
        assert!(snapshot.result.is_none());
    }

    #[test]
    fn test_terminal_status_never_overwritten() {
        let job = job();
        job.mark_running().unwrap();
        job.mark_cancelled("cancelled by caller");
        job.mark_completed(result());
        job.mark_failed("too late");

        let snapshot = job.snapshot();
        assert_eq!(snapshot.status, JobStatus::Cancelled);
        assert_eq!(snapshot.error.as_deref(), Some("cancelled by caller"));
        assert!(snapshot.result.is_none());
    }

    #[test]
    fn test_terminal_snapshot_idempotent() {
        let job = job();
        job.mark_running().unwrap();
        job.mark_completed(result());

        let first = serde_json::to_string(&job.snapshot()).unwrap();
        let second = serde_json::to_string(&job.snapshot()).unwrap();
        assert_eq!(first, second);
    }
}
