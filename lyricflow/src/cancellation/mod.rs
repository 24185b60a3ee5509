//! Cooperative cancellation.
//!
//! Cancellation in lyricflow is a signal, not an interruption: any caller
//! may set a job's token at any time, but the execution task observes it
//! only at stage boundaries and performs the final status write itself.
//! In-flight backend calls (including dispatched fan-out reviewers) are
//! allowed to finish.

mod token;

pub use token::CancellationToken;

/// Reason recorded when a caller cancels a job.
pub const CANCELLED_BY_CALLER: &str = "cancelled by caller";

/// Reason recorded when the manager shuts down.
pub const CANCELLED_ON_SHUTDOWN: &str = "cancelled on shutdown";
