//! Progress reporting.
//!
//! The pipeline invokes a [`ProgressReporter`] after each stage transition.
//! Delivery is best-effort by contract: a slow, absent, or disconnected
//! consumer must never block or fail the pipeline, so every implementation
//! here is synchronous, infallible, and bounded.

mod hub;
mod reporter;

pub use hub::ProgressHub;
pub use reporter::{
    CollectingProgressReporter, NoOpProgressReporter, ProgressReporter,
    ProgressUpdate, TracingProgressReporter,
};
