//! Test support: scripted backends and fixtures.
//!
//! These helpers back the crate's own test suite and are exported for
//! downstream integration tests; none of them touch a real generation
//! service.

pub mod fixtures;
pub mod mocks;

pub use mocks::{FailingBackend, ScriptedBackend, StaticBackend};
