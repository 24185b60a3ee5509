//! Job manager: creation, start, tracking, cancellation, shutdown.

use super::record::{Job, JobSnapshot};
use crate::cancellation::{CANCELLED_BY_CALLER, CANCELLED_ON_SHUTDOWN};
use crate::errors::PipelineError;
use crate::executor::{GenerationBackend, StageExecutor, WorkerPool};
use crate::graph::{PipelineRunner, Topology};
use crate::progress::{ProgressReporter, ProgressUpdate};
use crate::state::{JobParams, SongState};
use crate::PipelineConfig;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// How long `cleanup` waits for execution tasks to acknowledge cancellation.
const CLEANUP_DRAIN: Duration = Duration::from_secs(5);

/// Creates, starts, tracks, and cancels jobs.
///
/// The job table is the only shared mutable structure in the crate. Each
/// job gets exactly one execution task, admitted through a bounded worker
/// pool sized by `max_concurrent_jobs`; excess start requests queue for a
/// free worker. Jobs are independent and may interleave arbitrarily on the
/// pool.
pub struct JobManager {
    jobs: DashMap<Uuid, Arc<Job>>,
    pool: WorkerPool,
    config: PipelineConfig,
}

impl JobManager {
    /// Creates a manager with the given configuration.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let pool = WorkerPool::new(config.max_concurrent_jobs);
        Self {
            jobs: DashMap::new(),
            pool,
            config,
        }
    }

    /// Returns the manager's configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the shared worker pool.
    #[must_use]
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Allocates a job in Queued status without starting execution.
    ///
    /// # Errors
    ///
    /// Fails only on malformed input; business rules beyond well-formedness
    /// are the caller's responsibility.
    pub fn create_job(&self, params: JobParams) -> Result<Uuid, PipelineError> {
        params.validate()?;
        let job = Arc::new(Job::new(params));
        let job_id = job.id();
        self.jobs.insert(job_id, job);
        info!(job_id = %job_id, "job created");
        Ok(job_id)
    }

    /// Looks up a job by id.
    #[must_use]
    pub fn get_job(&self, job_id: &Uuid) -> Option<Arc<Job>> {
        self.jobs.get(job_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns a status snapshot, with not-found as a distinct outcome.
    pub fn snapshot(&self, job_id: &Uuid) -> Result<JobSnapshot, PipelineError> {
        self.get_job(job_id)
            .map(|job| job.snapshot())
            .ok_or(PipelineError::JobNotFound(*job_id))
    }

    /// Returns the number of tracked jobs.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Transitions Queued → Running and schedules the job's single
    /// execution task. The task queues on the worker pool for admission;
    /// this call returns without blocking on execution.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::JobNotFound`] for an unknown id and an
    /// internal error when the job was already started.
    pub fn start_job(
        &self,
        job_id: &Uuid,
        backend: Arc<dyn GenerationBackend>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Result<(), PipelineError> {
        let job = self
            .get_job(job_id)
            .ok_or(PipelineError::JobNotFound(*job_id))?;

        job.mark_running()?;
        info!(job_id = %job_id, topology = %job.params().topology, "job started");

        let pool = self.pool.clone();
        let config = self.config.clone();
        let task_job = Arc::clone(&job);
        let handle = tokio::spawn(async move {
            run_job(task_job, backend, reporter, pool, config).await;
        });
        job.set_task(handle);
        Ok(())
    }

    /// Signals cancellation for a job.
    ///
    /// Returns false when the job is unknown, has no execution task yet, or
    /// is already terminal. Cancellation is cooperative: the execution task
    /// observes the signal at the next stage boundary, so latency is
    /// bounded by the in-flight stage call rather than instantaneous.
    #[must_use]
    pub fn cancel_job(&self, job_id: &Uuid) -> bool {
        let Some(job) = self.get_job(job_id) else {
            return false;
        };
        if job.is_terminal() || !job.has_execution_task() {
            return false;
        }
        job.cancel_token().cancel(CANCELLED_BY_CALLER);
        info!(job_id = %job_id, "cancellation signalled");
        true
    }

    /// Signals cancellation to every non-terminal job and drains execution
    /// tasks best-effort. The only path that touches all jobs at once;
    /// intended for process shutdown.
    pub async fn cleanup(&self) {
        let mut handles = Vec::new();
        for entry in self.jobs.iter() {
            let job = entry.value();
            if !job.is_terminal() {
                job.cancel_token().cancel(CANCELLED_ON_SHUTDOWN);
                if let Some(handle) = job.take_task() {
                    handles.push(handle);
                }
            }
        }

        if handles.is_empty() {
            return;
        }
        info!(tasks = handles.len(), "draining execution tasks");
        if tokio::time::timeout(CLEANUP_DRAIN, futures::future::join_all(handles))
            .await
            .is_err()
        {
            warn!("cleanup drain timed out; abandoning remaining tasks");
        }
    }
}

/// The body of a job's single execution task: admission, topology assembly,
/// the run itself, the one terminal status write, and the one best-effort
/// terminal notification.
async fn run_job(
    job: Arc<Job>,
    backend: Arc<dyn GenerationBackend>,
    reporter: Arc<dyn ProgressReporter>,
    pool: WorkerPool,
    config: PipelineConfig,
) {
    // Admission control: hold one worker slot for the whole run.
    let Ok(_permit) = pool.acquire().await else {
        job.mark_failed("worker pool closed before admission");
        return;
    };

    let topology = match Topology::for_kind(job.params().topology) {
        Ok(topology) => topology,
        Err(err) => {
            job.mark_failed(err.to_string());
            return;
        }
    };
    let total_steps = topology.total_steps();

    let executor = StageExecutor::new(backend, pool, config.reviewer_count);
    let runner = PipelineRunner::new(
        topology,
        executor,
        Arc::clone(&reporter),
        job.cancel_token(),
        job.id(),
    );

    let initial = SongState::seeded(job.params().clone(), &config);
    match runner.run(initial).await {
        Ok(final_state) => {
            job.mark_completed(final_state.into_result());
            reporter.try_report(&ProgressUpdate::completion(job.id(), total_steps));
        }
        Err(PipelineError::Cancelled(reason)) => {
            job.mark_cancelled(reason.clone());
            reporter.try_report(&ProgressUpdate::terminal(
                job.id(),
                "cancelled",
                total_steps,
                reason,
            ));
        }
        Err(err) => {
            let message = err.to_string();
            warn!(job_id = %job.id(), error = %message, "job failed");
            job.mark_failed(message.clone());
            reporter.try_report(&ProgressUpdate::terminal(
                job.id(),
                "failed",
                total_steps,
                message,
            ));
        }
    }
}
