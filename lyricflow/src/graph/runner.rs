//! Sequential pipeline execution over a fixed topology.

use super::route;
use super::topology::{Edge, StageId, StageNode, Topology};
use crate::cancellation::{CancellationToken, CANCELLED_BY_CALLER};
use crate::errors::PipelineError;
use crate::executor::StageExecutor;
use crate::progress::{ProgressReporter, ProgressUpdate};
use crate::state::{SongState, StateUpdate};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Executes one pipeline run to completion for a single job.
///
/// Stages run strictly one at a time; the only concurrency inside a run is
/// the review fan-out owned by the stage executor. After each stage the
/// runner reports progress best-effort, merges the partial update, and
/// follows the stage's edge. The cancellation token is checked at every
/// stage boundary: in-flight backend calls are never interrupted, only the
/// next stage is prevented from starting.
pub struct PipelineRunner {
    topology: Topology,
    executor: StageExecutor,
    reporter: Arc<dyn ProgressReporter>,
    cancel: Arc<CancellationToken>,
    job_id: Uuid,
}

impl PipelineRunner {
    /// Creates a runner bound to one job.
    #[must_use]
    pub fn new(
        topology: Topology,
        executor: StageExecutor,
        reporter: Arc<dyn ProgressReporter>,
        cancel: Arc<CancellationToken>,
        job_id: Uuid,
    ) -> Self {
        Self {
            topology,
            executor,
            reporter,
            cancel,
            job_id,
        }
    }

    /// Returns the topology this runner executes.
    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Runs the pipeline from the seeded state to a final state.
    ///
    /// Given identical initial state and identical backend outputs, the
    /// sequence of visited stages and the final state are reproducible.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Stage`] on the first stage failure (nothing
    /// is committed as a result) and [`PipelineError::Cancelled`] when the
    /// token is observed at a stage boundary.
    pub async fn run(&self, mut state: SongState) -> Result<SongState, PipelineError> {
        let mut current = self.topology.entry();

        loop {
            if self.cancel.is_cancelled() {
                let reason = self
                    .cancel
                    .reason()
                    .unwrap_or_else(|| CANCELLED_BY_CALLER.to_string());
                info!(job_id = %self.job_id, stage = %current, "run cancelled at stage boundary");
                return Err(PipelineError::Cancelled(reason));
            }

            let node = *self.topology.node(current).ok_or_else(|| {
                PipelineError::Internal(format!(
                    "stage '{current}' missing from {} topology",
                    self.topology.kind()
                ))
            })?;

            debug!(job_id = %self.job_id, stage = %current, round = state.round, "executing stage");
            let update = self
                .executor
                .execute(current, &state)
                .await
                .map_err(|err| PipelineError::Stage {
                    stage: current,
                    message: err.to_string(),
                })?;

            self.report(&node, &state, &update);
            update.apply(&mut state);

            current = match node.next {
                Edge::To(next) => next,
                Edge::Router {
                    kind,
                    stay,
                    advance,
                } => route(kind, &state, stay, advance),
                Edge::End => {
                    info!(job_id = %self.job_id, rounds = state.round, score = state.score, "run finished");
                    return Ok(state);
                }
            };
        }
    }

    /// Best-effort progress report after a stage; never fails the run.
    fn report(&self, node: &StageNode, state: &SongState, update: &StateUpdate) {
        let message = progress_message(node.id, state, update);
        let progress = ProgressUpdate::new(
            self.job_id,
            node.id.as_str(),
            node.step_index,
            self.topology.total_steps(),
            message,
        );
        self.reporter.try_report(&progress);
    }
}

/// Human-readable message for a completed stage.
fn progress_message(stage: StageId, state: &SongState, update: &StateUpdate) -> String {
    match stage {
        StageId::Narrative => "Narrative scaffold generated".to_string(),
        StageId::Draft => "Draft generated".to_string(),
        StageId::Review => format!(
            "Review round {}: score {:.2}",
            update.round.unwrap_or(state.round + 1),
            update.score.unwrap_or_default(),
        ),
        StageId::Critic => "Critic feedback applied".to_string(),
        StageId::TargetedRevise => "Applied targeted fixes from preflight".to_string(),
        StageId::Preflight => {
            let issues = update
                .preflight_issues
                .as_ref()
                .map_or(0, Vec::len);
            if update.preflight_passed.unwrap_or(false) {
                "Preflight passed".to_string()
            } else {
                format!("Preflight flagged {issues} issue(s)")
            }
        }
        StageId::Refine => "Arrangement refinement applied".to_string(),
        StageId::Metadata => "Metadata summary generated".to_string(),
        StageId::Persist => match &update.filename {
            Some(filename) => format!("Song saved to {filename}"),
            None => "Song saved".to_string(),
        },
    }
}
