//! Per-run pipeline state.
//!
//! The state is an explicit, serializable value owned exclusively by the
//! active execution task and passed between stages; stages return partial
//! [`StateUpdate`]s that are merged in, later writes overwriting earlier
//! ones with no implicit deletion.

mod signals;

pub use signals::{
    PreflightReport, ScoreSignal, SongMetadata, UNPARSEABLE_PREFLIGHT_ISSUE,
    UNPARSEABLE_SCORE_RATIONALE,
};

use crate::graph::TopologyKind;
use crate::PipelineConfig;
use serde::{Deserialize, Serialize};

/// Immutable input parameters for one job, fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobParams {
    /// The song request or description.
    pub user_input: String,
    /// Optional caller-provided title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_name: Option<String>,
    /// Optional persona name driving style loading in the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    /// Which stage topology this job runs.
    #[serde(default)]
    pub topology: TopologyKind,
    /// Musical blend (2-3 styles).
    #[serde(default)]
    pub blend: Vec<String>,
    /// Mood style ("dark" or "clean").
    #[serde(default = "default_mood_style")]
    pub mood_style: String,
    /// Themes the lyrics should include.
    #[serde(default)]
    pub themes_include: Vec<String>,
    /// Themes the lyrics should avoid.
    #[serde(default)]
    pub themes_avoid: Vec<String>,
    /// Beats per minute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<u16>,
    /// Musical key (e.g. "C", "Am").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_key: Option<String>,
}

fn default_mood_style() -> String {
    "dark".to_string()
}

impl JobParams {
    /// Creates parameters for the given request with defaults everywhere
    /// else.
    #[must_use]
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            song_name: None,
            persona: None,
            topology: TopologyKind::default(),
            blend: Vec::new(),
            mood_style: default_mood_style(),
            themes_include: Vec::new(),
            themes_avoid: Vec::new(),
            bpm: None,
            music_key: None,
        }
    }

    /// Sets the song title.
    #[must_use]
    pub fn with_song_name(mut self, name: impl Into<String>) -> Self {
        self.song_name = Some(name.into());
        self
    }

    /// Sets the persona.
    #[must_use]
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    /// Selects the topology.
    #[must_use]
    pub fn with_topology(mut self, topology: TopologyKind) -> Self {
        self.topology = topology;
        self
    }

    /// Sets the musical blend.
    #[must_use]
    pub fn with_blend(mut self, blend: Vec<String>) -> Self {
        self.blend = blend;
        self
    }

    /// Validates creation input. Business rules beyond well-formedness are
    /// the caller's responsibility.
    pub fn validate(&self) -> Result<(), crate::errors::ValidationError> {
        if self.user_input.trim().is_empty() {
            return Err(crate::errors::ValidationError::new(
                "user_input must not be empty",
            )
            .with_field("user_input"));
        }
        Ok(())
    }
}

/// The accumulated state of one pipeline run.
///
/// Seeded from [`JobParams`] and the pipeline configuration, then extended
/// stage by stage. `round` increases monotonically and is bounded by
/// `max_rounds`; the routers enforce termination at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongState {
    /// The job's immutable creation input.
    pub params: JobParams,
    /// Current lyrics text.
    pub lyrics: String,
    /// Most recent reviewer or preflight feedback.
    pub feedback: String,
    /// Last quality score observed.
    pub score: f64,
    /// Retry rounds consumed so far.
    pub round: u32,
    /// Upper bound on retry rounds.
    pub max_rounds: u32,
    /// Score at or above which the review loop exits early.
    pub score_threshold: f64,
    /// Whether the last preflight check passed.
    pub preflight_passed: bool,
    /// Issues flagged by the last preflight check.
    pub preflight_issues: Vec<String>,
    /// Narrative scaffold (extended topology only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    /// Generated song metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SongMetadata>,
    /// Filename reported by the persistence stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl SongState {
    /// Seeds a fresh run state from job parameters and configuration.
    #[must_use]
    pub fn seeded(params: JobParams, config: &PipelineConfig) -> Self {
        Self {
            params,
            lyrics: String::new(),
            feedback: String::new(),
            score: 0.0,
            round: 0,
            max_rounds: config.max_rounds,
            score_threshold: config.score_threshold,
            preflight_passed: false,
            preflight_issues: Vec::new(),
            narrative: None,
            metadata: None,
            filename: None,
        }
    }

    /// Converts the final state into the job's success payload.
    #[must_use]
    pub fn into_result(self) -> GenerationResult {
        let title = extract_title(&self.lyrics, self.params.song_name.as_deref());
        GenerationResult {
            title,
            lyrics: self.lyrics,
            metadata: self.metadata.unwrap_or_default(),
            filename: self.filename,
            narrative: self.narrative,
            rounds_used: self.round,
            final_score: self.score,
        }
    }
}

/// A partial state update produced by one stage.
///
/// Every field is optional; [`StateUpdate::apply`] overwrites only what the
/// stage actually produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateUpdate {
    /// Revised or drafted lyrics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    /// Feedback the revision was based on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// Fresh quality score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// New round counter value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    /// Preflight verdict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preflight_passed: Option<bool>,
    /// Preflight issues.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preflight_issues: Option<Vec<String>>,
    /// Narrative scaffold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    /// Song metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SongMetadata>,
    /// Persisted filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl StateUpdate {
    /// Merges this update into the state. Fields the stage did not produce
    /// are left untouched; nothing is ever deleted.
    pub fn apply(self, state: &mut SongState) {
        if let Some(lyrics) = self.lyrics {
            state.lyrics = lyrics;
        }
        if let Some(feedback) = self.feedback {
            state.feedback = feedback;
        }
        if let Some(score) = self.score {
            state.score = score;
        }
        if let Some(round) = self.round {
            state.round = round;
        }
        if let Some(passed) = self.preflight_passed {
            state.preflight_passed = passed;
        }
        if let Some(issues) = self.preflight_issues {
            state.preflight_issues = issues;
        }
        if let Some(narrative) = self.narrative {
            state.narrative = Some(narrative);
        }
        if let Some(metadata) = self.metadata {
            state.metadata = Some(metadata);
        }
        if let Some(filename) = self.filename {
            state.filename = Some(filename);
        }
    }
}

/// The success payload copied into a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Resolved song title.
    pub title: String,
    /// Final lyrics.
    pub lyrics: String,
    /// Generated metadata (defaults if the metadata stage fell back).
    pub metadata: SongMetadata,
    /// Filename from the persistence stage, if it ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Narrative scaffold, if the extended topology ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    /// Retry rounds the run consumed.
    pub rounds_used: u32,
    /// The last quality score observed.
    pub final_score: f64,
}

/// Resolves the song title: caller-provided name first, then a
/// `## Song Title` heading in the lyrics, then a fixed fallback.
#[must_use]
pub fn extract_title(lyrics: &str, provided: Option<&str>) -> String {
    if let Some(title) = provided {
        let title = title.trim();
        if !title.is_empty() {
            return title.to_string();
        }
    }

    const MARKER: &str = "## Song Title";
    if let Some(pos) = lyrics.find(MARKER) {
        let rest = &lyrics[pos + MARKER.len()..];
        let line = rest.split('\n').next().unwrap_or("");
        let title = line.trim().trim_start_matches(':').trim();
        if !title.is_empty() {
            return title.to_string();
        }
    }

    "Unknown Song".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seeded() -> SongState {
        SongState::seeded(
            JobParams::new("a song about rain"),
            &PipelineConfig::default(),
        )
    }

    #[test]
    fn test_params_validate_rejects_empty_input() {
        let params = JobParams::new("   ");
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_params_builder() {
        let params = JobParams::new("request")
            .with_song_name("Glass River")
            .with_topology(TopologyKind::Extended)
            .with_blend(vec!["Gospel".to_string(), "Soul".to_string()]);

        assert_eq!(params.song_name.as_deref(), Some("Glass River"));
        assert_eq!(params.topology, TopologyKind::Extended);
        assert_eq!(params.blend.len(), 2);
    }

    #[test]
    fn test_seeded_state_counters() {
        let state = seeded();
        assert_eq!(state.round, 0);
        assert_eq!(state.max_rounds, 3);
        assert!(!state.preflight_passed);
        assert!(state.lyrics.is_empty());
    }

    #[test]
    fn test_update_apply_overwrites_only_produced_fields() {
        let mut state = seeded();
        state.lyrics = "first draft".to_string();
        state.score = 4.0;

        let update = StateUpdate {
            lyrics: Some("second draft".to_string()),
            round: Some(1),
            ..StateUpdate::default()
        };
        update.apply(&mut state);

        assert_eq!(state.lyrics, "second draft");
        assert_eq!(state.round, 1);
        // Untouched fields survive the merge
        assert!((state.score - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_into_result_uses_provided_title() {
        let mut state = SongState::seeded(
            JobParams::new("req").with_song_name("Night Train"),
            &PipelineConfig::default(),
        );
        state.lyrics = "## Song Title Something Else\nverse".to_string();

        let result = state.into_result();
        assert_eq!(result.title, "Night Train");
    }

    #[test]
    fn test_extract_title_from_heading() {
        let lyrics = "intro\n## Song Title: Dust and Echoes\nverse one";
        assert_eq!(extract_title(lyrics, None), "Dust and Echoes");
    }

    #[test]
    fn test_extract_title_fallback() {
        assert_eq!(extract_title("no heading here", None), "Unknown Song");
    }

    #[test]
    fn test_state_round_trips_through_serde() {
        let state = seeded();
        let json = serde_json::to_string(&state).unwrap();
        let back: SongState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_rounds, state.max_rounds);
        assert_eq!(back.params.user_input, state.params.user_input);
    }
}
