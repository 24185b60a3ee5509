//! Shared fixtures for the test suite.

use crate::graph::TopologyKind;
use crate::state::{JobParams, SongState};
use crate::PipelineConfig;

/// Job parameters for a plain standard-topology run.
#[must_use]
pub fn sample_params() -> JobParams {
    JobParams::new("a slow song about leaving home")
        .with_song_name("Leaving Home")
        .with_topology(TopologyKind::Standard)
}

/// A small, fast configuration for tests: two rounds, threshold 8.0,
/// three reviewers, and enough pool slots that fan-out never starves.
#[must_use]
pub fn test_config() -> PipelineConfig {
    PipelineConfig::default()
        .with_max_rounds(2)
        .with_score_threshold(8.0)
        .with_reviewer_count(3)
        .with_max_concurrent_jobs(8)
}

/// A freshly seeded run state over [`sample_params`] and [`test_config`].
#[must_use]
pub fn seeded_state() -> SongState {
    SongState::seeded(sample_params(), &test_config())
}
