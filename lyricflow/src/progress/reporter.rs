//! Progress reporter trait and implementations.

use crate::utils::{now, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// One progress update, emitted after a stage transition or at a terminal
/// job transition.
///
/// `step_index / total_steps` is non-decreasing within one forward pass of a
/// topology; retry loops revisit an index, so consumers must tolerate a
/// plateaued percentage across rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// The job this update belongs to.
    pub job_id: Uuid,
    /// Stage wire name, or "complete" / a terminal status name.
    pub step: String,
    /// Topology-specific step index.
    pub step_index: u32,
    /// Total steps for the topology.
    pub total_steps: u32,
    /// Human-readable message.
    pub message: String,
    /// Completion percentage derived from the step index.
    pub percentage: f64,
    /// When the update was produced.
    pub timestamp: Timestamp,
}

impl ProgressUpdate {
    /// Creates a stage-transition update; the percentage is derived from
    /// the step index.
    #[must_use]
    pub fn new(
        job_id: Uuid,
        step: impl Into<String>,
        step_index: u32,
        total_steps: u32,
        message: impl Into<String>,
    ) -> Self {
        let total = total_steps.max(1);
        let percentage = (f64::from(step_index.min(total)) / f64::from(total)) * 100.0;
        Self {
            job_id,
            step: step.into(),
            step_index,
            total_steps: total,
            message: message.into(),
            percentage,
            timestamp: now(),
        }
    }

    /// The single completion notification, landing on 100%.
    #[must_use]
    pub fn completion(job_id: Uuid, total_steps: u32) -> Self {
        Self::new(
            job_id,
            "complete",
            total_steps,
            total_steps,
            "Song generation complete!",
        )
    }

    /// The single terminal notification for a failed or cancelled run.
    #[must_use]
    pub fn terminal(
        job_id: Uuid,
        status: impl Into<String>,
        total_steps: u32,
        message: impl Into<String>,
    ) -> Self {
        Self::new(job_id, status, total_steps, total_steps, message)
    }
}

/// Sink for progress updates.
///
/// Invoked synchronously from the execution task after each stage; must not
/// block beyond a bounded best-effort attempt and must never propagate an
/// error into the pipeline.
pub trait ProgressReporter: Send + Sync {
    /// Delivers an update best-effort. Failures are swallowed.
    fn try_report(&self, update: &ProgressUpdate);
}

/// A reporter that discards all updates.
///
/// Used as the default when no delivery target is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn try_report(&self, _update: &ProgressUpdate) {
        // Intentionally empty - discards all updates
    }
}

/// A reporter that logs updates through the tracing framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgressReporter;

impl ProgressReporter for TracingProgressReporter {
    fn try_report(&self, update: &ProgressUpdate) {
        info!(
            job_id = %update.job_id,
            step = %update.step,
            step_index = update.step_index,
            percentage = update.percentage,
            "{}", update.message
        );
    }
}

/// A collecting reporter for tests.
#[derive(Debug, Default)]
pub struct CollectingProgressReporter {
    updates: parking_lot::RwLock<Vec<ProgressUpdate>>,
}

impl CollectingProgressReporter {
    /// Creates a new collecting reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected updates.
    #[must_use]
    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.read().clone()
    }

    /// Returns the collected step names, in order.
    #[must_use]
    pub fn steps(&self) -> Vec<String> {
        self.updates
            .read()
            .iter()
            .map(|update| update.step.clone())
            .collect()
    }

    /// Returns the number of collected updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.read().len()
    }

    /// Returns true if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.read().is_empty()
    }
}

impl ProgressReporter for CollectingProgressReporter {
    fn try_report(&self, update: &ProgressUpdate) {
        self.updates.write().push(update.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_derivation() {
        let update = ProgressUpdate::new(Uuid::new_v4(), "draft", 3, 6, "msg");
        assert!((update.percentage - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_completion_lands_on_hundred() {
        let update = ProgressUpdate::completion(Uuid::new_v4(), 6);
        assert_eq!(update.step, "complete");
        assert!((update.percentage - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_total_steps_does_not_divide_by_zero() {
        let update = ProgressUpdate::new(Uuid::new_v4(), "draft", 0, 0, "msg");
        assert!((update.percentage - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_collecting_reporter_records_in_order() {
        let reporter = CollectingProgressReporter::new();
        let job_id = Uuid::new_v4();
        reporter.try_report(&ProgressUpdate::new(job_id, "draft", 0, 6, "a"));
        reporter.try_report(&ProgressUpdate::new(job_id, "review", 1, 6, "b"));

        assert_eq!(reporter.len(), 2);
        assert_eq!(reporter.steps(), vec!["draft".to_string(), "review".to_string()]);
    }

    #[test]
    fn test_noop_reporter() {
        let reporter = NoOpProgressReporter;
        reporter.try_report(&ProgressUpdate::completion(Uuid::new_v4(), 6));
        // Should not panic
    }
}
