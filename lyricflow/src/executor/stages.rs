//! Stage semantics over the generation backend.

use super::backend::{BackendCall, GenerationBackend};
use super::fanout::run_review_panel;
use super::pool::WorkerPool;
use crate::errors::StageError;
use crate::graph::StageId;
use crate::state::{PreflightReport, ScoreSignal, SongMetadata, SongState, StateUpdate};
use std::sync::Arc;
use tracing::{debug, warn};

/// Executes individual stages against the injected backend.
///
/// This is the single dispatch point from stage identity to stage
/// semantics. Every arm is a pure function of the current state: it reads
/// accumulated fields, calls the backend, and returns a partial update. No
/// stage call carries a pipeline-level deadline; backends are trusted to
/// bound themselves.
pub struct StageExecutor {
    backend: Arc<dyn GenerationBackend>,
    pool: WorkerPool,
    reviewer_count: usize,
}

impl StageExecutor {
    /// Creates an executor over the given backend and shared pool.
    #[must_use]
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        pool: WorkerPool,
        reviewer_count: usize,
    ) -> Self {
        Self {
            backend,
            pool,
            reviewer_count: reviewer_count.max(1),
        }
    }

    /// Returns the configured fan-out width.
    #[must_use]
    pub fn reviewer_count(&self) -> usize {
        self.reviewer_count
    }

    /// Executes one stage and returns its partial state update.
    pub async fn execute(
        &self,
        stage: StageId,
        state: &SongState,
    ) -> Result<StateUpdate, StageError> {
        match stage {
            StageId::Narrative => self.develop_narrative(state).await,
            StageId::Draft => self.draft(state).await,
            StageId::Review => self.review_round(state).await,
            StageId::Critic => self.critic(state).await,
            StageId::TargetedRevise => self.targeted_revise(state).await,
            StageId::Preflight => self.preflight(state).await,
            StageId::Refine => self.refine(state).await,
            StageId::Metadata => self.metadata(state).await,
            StageId::Persist => self.persist(state).await,
        }
    }

    async fn develop_narrative(&self, state: &SongState) -> Result<StateUpdate, StageError> {
        let narrative = self
            .backend
            .invoke(BackendCall::DevelopNarrative, state)
            .await?;
        Ok(StateUpdate {
            narrative: Some(narrative),
            ..StateUpdate::default()
        })
    }

    async fn draft(&self, state: &SongState) -> Result<StateUpdate, StageError> {
        let lyrics = self.backend.invoke(BackendCall::DraftLyrics, state).await?;
        Ok(StateUpdate {
            lyrics: Some(lyrics),
            ..StateUpdate::default()
        })
    }

    /// One review round: fan-out, revise against the merged feedback, then
    /// score the revision. Consumes one retry round.
    async fn review_round(&self, state: &SongState) -> Result<StateUpdate, StageError> {
        let feedback =
            run_review_panel(&self.backend, &self.pool, state, self.reviewer_count).await?;

        let mut working = state.clone();
        working.feedback = feedback.clone();
        let revised = self
            .backend
            .invoke(BackendCall::ReviseLyrics, &working)
            .await?;

        working.lyrics = revised.clone();
        let raw_score = self
            .backend
            .invoke(BackendCall::ScoreLyrics, &working)
            .await?;
        let signal = ScoreSignal::parse(&raw_score);
        if signal.rationale == crate::state::UNPARSEABLE_SCORE_RATIONALE {
            warn!(round = state.round + 1, "scoring output unparseable; falling back to 0.0");
        }
        debug!(round = state.round + 1, score = signal.score, "review round scored");

        Ok(StateUpdate {
            lyrics: Some(revised),
            feedback: Some(feedback),
            score: Some(signal.score),
            round: Some(state.round + 1),
            ..StateUpdate::default()
        })
    }

    /// Critic pass: one critique call, then a revision against it.
    async fn critic(&self, state: &SongState) -> Result<StateUpdate, StageError> {
        let critique = self
            .backend
            .invoke(BackendCall::CritiqueLyrics, state)
            .await?;

        let mut working = state.clone();
        working.feedback = critique;
        let revised = self
            .backend
            .invoke(BackendCall::ReviseLyrics, &working)
            .await?;
        Ok(StateUpdate {
            lyrics: Some(revised),
            ..StateUpdate::default()
        })
    }

    /// Revise specifically against the preflight issues. Consumes one retry
    /// round.
    async fn targeted_revise(&self, state: &SongState) -> Result<StateUpdate, StageError> {
        let feedback = std::iter::once("Fix these preflight issues:".to_string())
            .chain(state.preflight_issues.iter().map(|issue| format!("- {issue}")))
            .collect::<Vec<_>>()
            .join("\n");

        let mut working = state.clone();
        working.feedback = feedback.clone();
        let revised = self
            .backend
            .invoke(BackendCall::ReviseLyrics, &working)
            .await?;

        Ok(StateUpdate {
            lyrics: Some(revised),
            feedback: Some(feedback),
            round: Some(state.round + 1),
            ..StateUpdate::default()
        })
    }

    async fn preflight(&self, state: &SongState) -> Result<StateUpdate, StageError> {
        let raw = self
            .backend
            .invoke(BackendCall::PreflightCheck, state)
            .await?;
        let report = PreflightReport::parse(&raw);
        Ok(StateUpdate {
            preflight_passed: Some(report.passed),
            preflight_issues: Some(report.issues),
            ..StateUpdate::default()
        })
    }

    async fn refine(&self, state: &SongState) -> Result<StateUpdate, StageError> {
        let refined = self
            .backend
            .invoke(BackendCall::RefineArrangement, state)
            .await?;
        Ok(StateUpdate {
            lyrics: Some(refined),
            ..StateUpdate::default()
        })
    }

    async fn metadata(&self, state: &SongState) -> Result<StateUpdate, StageError> {
        let raw = self
            .backend
            .invoke(BackendCall::SummarizeMetadata, state)
            .await?;
        Ok(StateUpdate {
            metadata: Some(SongMetadata::parse(&raw)),
            ..StateUpdate::default()
        })
    }

    async fn persist(&self, state: &SongState) -> Result<StateUpdate, StageError> {
        let filename = self.backend.invoke(BackendCall::PersistSong, state).await?;
        Ok(StateUpdate {
            filename: Some(filename),
            ..StateUpdate::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::seeded_state;
    use crate::testing::mocks::ScriptedBackend;
    use pretty_assertions::assert_eq;

    fn executor(backend: ScriptedBackend) -> StageExecutor {
        StageExecutor::new(Arc::new(backend), WorkerPool::new(8), 3)
    }

    #[tokio::test]
    async fn test_draft_updates_lyrics() {
        let backend = ScriptedBackend::new();
        backend.script("draft_lyrics", "verse one");
        let update = executor(backend)
            .execute(StageId::Draft, &seeded_state())
            .await
            .unwrap();
        assert_eq!(update.lyrics.as_deref(), Some("verse one"));
        assert!(update.round.is_none());
    }

    #[tokio::test]
    async fn test_review_round_bumps_round_and_scores() {
        let backend = ScriptedBackend::new();
        backend.script("revise_lyrics", "revised lyrics");
        backend.script("score_lyrics", r#"{"score": 7.5, "rationale": "ok"}"#);
        let update = executor(backend)
            .execute(StageId::Review, &seeded_state())
            .await
            .unwrap();

        assert_eq!(update.lyrics.as_deref(), Some("revised lyrics"));
        assert_eq!(update.round, Some(1));
        assert!((update.score.unwrap() - 7.5).abs() < f64::EPSILON);
        // Merged panel feedback carries seat labels
        assert!(update.feedback.unwrap().starts_with("Reviewer 1 Feedback:"));
    }

    #[tokio::test]
    async fn test_review_round_score_fallback() {
        let backend = ScriptedBackend::new();
        backend.script("revise_lyrics", "revised");
        backend.script("score_lyrics", "not json");
        let update = executor(backend)
            .execute(StageId::Review, &seeded_state())
            .await
            .unwrap();
        assert!((update.score.unwrap() - 0.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_targeted_revise_builds_issue_feedback() {
        let backend = ScriptedBackend::new();
        backend.script("revise_lyrics", "fixed lyrics");
        let mut state = seeded_state();
        state.preflight_issues = vec!["banned tag".to_string(), "chorus drift".to_string()];
        state.round = 1;

        let update = executor(backend)
            .execute(StageId::TargetedRevise, &state)
            .await
            .unwrap();

        assert_eq!(update.round, Some(2));
        let feedback = update.feedback.unwrap();
        assert!(feedback.starts_with("Fix these preflight issues:"));
        assert!(feedback.contains("- banned tag"));
        assert!(feedback.contains("- chorus drift"));
    }

    #[tokio::test]
    async fn test_preflight_parses_report() {
        let backend = ScriptedBackend::new();
        backend.script("preflight_check", r#"{"pass": false, "issues": ["x"]}"#);
        let update = executor(backend)
            .execute(StageId::Preflight, &seeded_state())
            .await
            .unwrap();
        assert_eq!(update.preflight_passed, Some(false));
        assert_eq!(update.preflight_issues.unwrap(), vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn test_stage_failure_propagates_message() {
        let backend = ScriptedBackend::new();
        backend.script_failure("draft_lyrics", "model unavailable");
        let err = executor(backend)
            .execute(StageId::Draft, &seeded_state())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "model unavailable");
    }

    #[tokio::test]
    async fn test_persist_records_filename() {
        let backend = ScriptedBackend::new();
        backend.script("persist_song", "songs/20260806_test.md");
        let update = executor(backend)
            .execute(StageId::Persist, &seeded_state())
            .await
            .unwrap();
        assert_eq!(update.filename.as_deref(), Some("songs/20260806_test.md"));
    }
}
