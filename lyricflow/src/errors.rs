//! Error types for the lyricflow orchestration core.
//!
//! The taxonomy is deliberately small: validation errors are rejected before
//! a job exists, stage failures abort a run with the backend's message kept
//! verbatim, and cancellation is a first-class terminal outcome rather than
//! a failure. Parse fallbacks (scores, preflight triage, metadata) and
//! progress-delivery failures are recovered locally and never appear here.

use crate::graph::StageId;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for pipeline orchestration.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// Malformed job-creation input, rejected before any job is created.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// An opaque generation call failed; aborts the run immediately.
    #[error("stage '{stage}' failed: {message}")]
    Stage {
        /// The stage that raised the failure.
        stage: StageId,
        /// The backend's error description, retained verbatim.
        message: String,
    },

    /// The run observed a cancellation signal at a stage boundary.
    #[error("pipeline cancelled: {0}")]
    Cancelled(String),

    /// The given job id is unknown to the manager.
    #[error("job {0} not found")]
    JobNotFound(Uuid),

    /// An orchestration invariant was breached (task join failure,
    /// double-start, malformed topology).
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Returns true if this error represents a cancellation rather than a
    /// genuine failure.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Error raised when job-creation input or a topology definition is invalid.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// The error message.
    pub message: String,
    /// The offending field or stage, if one can be named.
    pub field: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }

    /// Names the offending field.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// The typed failure an opaque generation call raises.
///
/// Converted into [`PipelineError::Stage`] at the graph boundary; the
/// message travels verbatim into the job's recorded error.
#[derive(Debug, Clone, Error)]
pub enum StageError {
    /// The backend call itself failed (upstream unavailability, malformed
    /// response, refused request).
    #[error("{0}")]
    Backend(String),

    /// The call's execution task was torn down before producing a result.
    #[error("{0}")]
    Interrupted(String),
}

impl StageError {
    /// Creates a backend failure.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_message_verbatim() {
        let err = PipelineError::Stage {
            stage: StageId::Review,
            message: "model unavailable".to_string(),
        };
        assert!(err.to_string().contains("model unavailable"));
        assert!(err.to_string().contains("review"));
    }

    #[test]
    fn test_validation_error_builder() {
        let err = ValidationError::new("user_input must not be empty")
            .with_field("user_input");
        assert_eq!(err.field.as_deref(), Some("user_input"));
        assert_eq!(err.to_string(), "user_input must not be empty");
    }

    #[test]
    fn test_validation_converts_to_pipeline_error() {
        let err: PipelineError = ValidationError::new("bad input").into();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[test]
    fn test_is_cancellation() {
        assert!(PipelineError::Cancelled("stop".to_string()).is_cancellation());
        assert!(!PipelineError::Internal("oops".to_string()).is_cancellation());
    }
}
