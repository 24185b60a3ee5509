//! Pipeline configuration.

use serde::{Deserialize, Serialize};

/// Configuration for pipeline execution and job admission.
///
/// Topology selection is a per-job input ([`crate::state::JobParams`]), not
/// part of this config; everything here is fixed for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum iterations of each bounded retry loop (review, preflight-fix).
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    /// Quality score at or above which the review loop exits early.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
    /// Number of concurrent reviewers in the review fan-out.
    #[serde(default = "default_reviewer_count")]
    pub reviewer_count: usize,
    /// Worker-pool size bounding concurrent job execution. Review fan-out
    /// sub-calls draw permits from the same pool, so this must account for
    /// the worst-case simultaneous fan-out width.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
    /// Bound on each attached progress channel; updates beyond it are
    /// dropped, never blocked on.
    #[serde(default = "default_progress_queue_size")]
    pub progress_queue_size: usize,
}

fn default_max_rounds() -> u32 {
    3
}

fn default_score_threshold() -> f64 {
    8.5
}

fn default_reviewer_count() -> usize {
    3
}

fn default_max_concurrent_jobs() -> usize {
    4
}

fn default_progress_queue_size() -> usize {
    64
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            score_threshold: default_score_threshold(),
            reviewer_count: default_reviewer_count(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            progress_queue_size: default_progress_queue_size(),
        }
    }
}

impl PipelineConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    ///
    /// Recognized variables: `REVIEW_MAX_ROUNDS`, `REVIEW_SCORE_THRESHOLD`,
    /// `REVIEW_PANEL_SIZE`, `MAX_CONCURRENT_JOBS`.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_parse("REVIEW_MAX_ROUNDS") {
            config.max_rounds = v;
        }
        if let Some(v) = env_parse("REVIEW_SCORE_THRESHOLD") {
            config.score_threshold = v;
        }
        if let Some(v) = env_parse("REVIEW_PANEL_SIZE") {
            config.reviewer_count = v;
        }
        if let Some(v) = env_parse("MAX_CONCURRENT_JOBS") {
            config.max_concurrent_jobs = v;
        }
        config
    }

    /// Sets the maximum retry rounds.
    #[must_use]
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Sets the review score threshold.
    #[must_use]
    pub fn with_score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = threshold;
        self
    }

    /// Sets the reviewer fan-out width.
    #[must_use]
    pub fn with_reviewer_count(mut self, count: usize) -> Self {
        self.reviewer_count = count;
        self
    }

    /// Sets the worker-pool size.
    #[must_use]
    pub fn with_max_concurrent_jobs(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max;
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_rounds, 3);
        assert_eq!(config.reviewer_count, 3);
        assert_eq!(config.max_concurrent_jobs, 4);
        assert!((config.score_threshold - 8.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::new()
            .with_max_rounds(2)
            .with_score_threshold(8.0)
            .with_reviewer_count(5);

        assert_eq!(config.max_rounds, 2);
        assert_eq!(config.reviewer_count, 5);
        assert!((config.score_threshold - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"max_rounds": 1}"#).unwrap();
        assert_eq!(config.max_rounds, 1);
        assert_eq!(config.reviewer_count, 3);
    }
}
