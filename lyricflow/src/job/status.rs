//! Job status enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle status of a job.
///
/// Transitions follow the strict partial order
/// Queued → Running → {Completed, Failed, Cancelled}; a terminal status is
/// never overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, not yet started.
    Queued,
    /// Execution task scheduled.
    Running,
    /// Finished with a result.
    Completed,
    /// A stage failure aborted the run.
    Failed,
    /// A cancellation signal was observed.
    Cancelled,
}

impl JobStatus {
    /// Returns true if the status is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}
