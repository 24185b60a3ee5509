//! Stage execution against the opaque generation backend.
//!
//! This module provides:
//! - The [`GenerationBackend`] seam the orchestration core calls through
//! - The shared bounded worker pool
//! - The review fan-out with deterministic merge
//! - The stage executor dispatching stage semantics

mod backend;
mod fanout;
mod pool;
mod stages;

pub use backend::{BackendCall, GenerationBackend};
pub use fanout::merge_feedback;
pub use pool::{WorkerPermit, WorkerPool};
pub use stages::StageExecutor;
