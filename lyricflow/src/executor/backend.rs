//! The opaque generation backend seam.

use crate::errors::StageError;
use crate::state::SongState;
use async_trait::async_trait;
use std::fmt;

/// One opaque content-generation call.
///
/// The orchestration core never inspects how a call is fulfilled; it only
/// names the call and hands over the accumulated state. `ReviewLyrics`
/// carries the 1-based panel seat so a backend can vary reviewer persona per
/// seat; the calls are otherwise identical across the fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendCall {
    /// Develop the narrative scaffold.
    DevelopNarrative,
    /// Draft the initial lyrics.
    DraftLyrics,
    /// Produce one reviewer's feedback.
    ReviewLyrics {
        /// 1-based seat on the review panel.
        seat: usize,
    },
    /// Revise lyrics against the feedback in the state.
    ReviseLyrics,
    /// Produce a single critic pass.
    CritiqueLyrics,
    /// Score the lyrics; expected to return a JSON score signal.
    ScoreLyrics,
    /// Run the preflight check; expected to return a JSON triage report.
    PreflightCheck,
    /// Summarize song metadata; expected to return JSON metadata.
    SummarizeMetadata,
    /// Apply the final arrangement refinement.
    RefineArrangement,
    /// Persist the finished song; returns the stored filename.
    PersistSong,
}

impl BackendCall {
    /// Returns the call's wire name (seat-independent).
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::DevelopNarrative => "develop_narrative",
            Self::DraftLyrics => "draft_lyrics",
            Self::ReviewLyrics { .. } => "review_lyrics",
            Self::ReviseLyrics => "revise_lyrics",
            Self::CritiqueLyrics => "critique_lyrics",
            Self::ScoreLyrics => "score_lyrics",
            Self::PreflightCheck => "preflight_check",
            Self::SummarizeMetadata => "summarize_metadata",
            Self::RefineArrangement => "refine_arrangement",
            Self::PersistSong => "persist_song",
        }
    }
}

impl fmt::Display for BackendCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReviewLyrics { seat } => write!(f, "review_lyrics[{seat}]"),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// The injected client performing opaque content-generation calls.
///
/// Implementations may do arbitrary external I/O; from the orchestration
/// core's perspective a call either returns text or raises a
/// [`StageError`]. Injected at job start (constructor injection), never
/// reached through ambient global state.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Performs one generation call against the accumulated state.
    async fn invoke(&self, call: BackendCall, state: &SongState) -> Result<String, StageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_names() {
        assert_eq!(BackendCall::DraftLyrics.name(), "draft_lyrics");
        assert_eq!(BackendCall::ReviewLyrics { seat: 2 }.name(), "review_lyrics");
    }

    #[test]
    fn test_review_display_includes_seat() {
        let call = BackendCall::ReviewLyrics { seat: 3 };
        assert_eq!(call.to_string(), "review_lyrics[3]");
    }
}
