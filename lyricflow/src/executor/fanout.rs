//! Parallel review fan-out with deterministic merge.

use super::backend::{BackendCall, GenerationBackend};
use super::pool::WorkerPool;
use crate::errors::StageError;
use crate::state::SongState;
use std::sync::Arc;
use tracing::debug;

/// Runs the review panel: `reviewer_count` concurrent calls against an
/// identical state snapshot, merged in invocation-seat order.
///
/// All calls run on the shared worker pool and the caller blocks until every
/// one completes; a single failing reviewer fails the whole fan-out (no
/// partial-success averaging). On an early failure the remaining dispatched
/// tasks are left to finish on their own rather than being aborted.
pub(crate) async fn run_review_panel(
    backend: &Arc<dyn GenerationBackend>,
    pool: &WorkerPool,
    state: &SongState,
    reviewer_count: usize,
) -> Result<String, StageError> {
    let mut handles = Vec::with_capacity(reviewer_count);
    for seat in 1..=reviewer_count {
        let backend = Arc::clone(backend);
        let pool = pool.clone();
        let snapshot = state.clone();
        handles.push(tokio::spawn(async move {
            let _permit = pool
                .acquire()
                .await
                .map_err(|_| StageError::Interrupted("worker pool closed".to_string()))?;
            backend
                .invoke(BackendCall::ReviewLyrics { seat }, &snapshot)
                .await
        }));
    }

    // Collect in seat order regardless of completion order; the first
    // failure (by seat, not by time) fails the fan-out.
    let mut feedbacks = Vec::with_capacity(reviewer_count);
    for (seat, handle) in handles.into_iter().enumerate() {
        let feedback = handle.await.map_err(|err| {
            StageError::Interrupted(format!("reviewer {} task failed: {err}", seat + 1))
        })??;
        feedbacks.push(feedback);
    }

    debug!(reviewers = reviewer_count, "review panel complete");
    Ok(merge_feedback(&feedbacks))
}

/// Concatenates reviewer feedback in seat order with per-reviewer labels.
///
/// The ordering guarantee is part of the fan-out contract: merged output is
/// identical regardless of scheduling jitter across the panel.
#[must_use]
pub fn merge_feedback(feedbacks: &[String]) -> String {
    feedbacks
        .iter()
        .enumerate()
        .map(|(idx, feedback)| format!("Reviewer {} Feedback:\n{}", idx + 1, feedback))
        .collect::<Vec<_>>()
        .join("\n\n")
}
