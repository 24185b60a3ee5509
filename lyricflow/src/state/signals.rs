//! Structured signals parsed out of backend text.
//!
//! Backends return free text; the orchestration layer interprets three of
//! those responses as structured signals. Each parse recovers locally with a
//! conservative default instead of failing the run, so the round-bounded
//! loops always terminate via `max_rounds` even against a misbehaving
//! backend.

use serde::{Deserialize, Serialize};

/// Rationale recorded when scoring output cannot be parsed.
pub const UNPARSEABLE_SCORE_RATIONALE: &str = "could not parse scoring output";

/// Issue recorded when preflight triage output cannot be parsed.
pub const UNPARSEABLE_PREFLIGHT_ISSUE: &str = "could not parse preflight output";

/// A quality score produced by the scoring call.
///
/// Expected wire form: `{"score": 8.4, "rationale": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSignal {
    /// Score from 0-10.
    pub score: f64,
    /// One-line rationale.
    #[serde(default)]
    pub rationale: String,
}

impl ScoreSignal {
    /// Parses scoring output, falling back to a zero score with a clearly
    /// marked rationale when the text is not the expected JSON.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw.trim()).unwrap_or_else(|_| Self::fallback())
    }

    /// The conservative default used when parsing fails.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            score: 0.0,
            rationale: UNPARSEABLE_SCORE_RATIONALE.to_string(),
        }
    }
}

/// The triaged result of a preflight check.
///
/// Expected wire form: `{"pass": true, "issues": []}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreflightReport {
    /// Whether the lyrics cleared preflight.
    #[serde(alias = "pass")]
    pub passed: bool,
    /// Issues to fix when `passed` is false.
    #[serde(default)]
    pub issues: Vec<String>,
}

impl PreflightReport {
    /// Parses triage output. An unparseable response counts as a failed
    /// check with a single marker issue, so the fix loop still runs and
    /// still terminates via `max_rounds`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw.trim()).unwrap_or_else(|_| Self {
            passed: false,
            issues: vec![UNPARSEABLE_PREFLIGHT_ISSUE.to_string()],
        })
    }
}

/// Metadata summarizing the finished song.
///
/// Expected wire form mirrors the field names below; missing fields take the
/// defaults, and a fully unparseable response yields `Self::default()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongMetadata {
    /// 1-2 sentence description of theme and style.
    #[serde(default = "default_description")]
    pub description: String,
    /// Style tokens that fit the song.
    #[serde(default)]
    pub styles: Vec<String>,
    /// Style tokens to avoid.
    #[serde(default)]
    pub exclude_styles: Vec<String>,
    /// Suggested target audience.
    #[serde(default = "default_audience")]
    pub target_audience: String,
    /// One-line commercial potential assessment.
    #[serde(default = "default_potential")]
    pub commercial_potential: String,
}

fn default_description() -> String {
    "Short description of the song's theme and style.".to_string()
}

fn default_audience() -> String {
    "General audience".to_string()
}

fn default_potential() -> String {
    "Unassessed".to_string()
}

impl Default for SongMetadata {
    fn default() -> Self {
        Self {
            description: default_description(),
            styles: Vec::new(),
            exclude_styles: Vec::new(),
            target_audience: default_audience(),
            commercial_potential: default_potential(),
        }
    }
}

impl SongMetadata {
    /// Parses metadata output with defaults on failure.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw.trim()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_score_parse() {
        let signal = ScoreSignal::parse(r#"{"score": 8.4, "rationale": "tight imagery"}"#);
        assert!((signal.score - 8.4).abs() < f64::EPSILON);
        assert_eq!(signal.rationale, "tight imagery");
    }

    #[test]
    fn test_score_parse_missing_rationale() {
        let signal = ScoreSignal::parse(r#"{"score": 6.0}"#);
        assert!((signal.score - 6.0).abs() < f64::EPSILON);
        assert!(signal.rationale.is_empty());
    }

    #[test]
    fn test_score_fallback_on_garbage() {
        let signal = ScoreSignal::parse("not json");
        assert!((signal.score - 0.0).abs() < f64::EPSILON);
        assert_eq!(signal.rationale, UNPARSEABLE_SCORE_RATIONALE);
    }

    #[test]
    fn test_preflight_parse_pass_alias() {
        let report = PreflightReport::parse(r#"{"pass": true, "issues": []}"#);
        assert!(report.passed);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_preflight_parse_flagged() {
        let report =
            PreflightReport::parse(r#"{"passed": false, "issues": ["chorus too long"]}"#);
        assert!(!report.passed);
        assert_eq!(report.issues, vec!["chorus too long".to_string()]);
    }

    #[test]
    fn test_preflight_fallback_fails_closed() {
        let report = PreflightReport::parse("<<garbage>>");
        assert!(!report.passed);
        assert_eq!(report.issues, vec![UNPARSEABLE_PREFLIGHT_ISSUE.to_string()]);
    }

    #[test]
    fn test_metadata_parse_partial() {
        let metadata = SongMetadata::parse(
            r#"{"description": "dusty road ballad", "styles": ["americana"]}"#,
        );
        assert_eq!(metadata.description, "dusty road ballad");
        assert_eq!(metadata.styles, vec!["americana".to_string()]);
        assert_eq!(metadata.target_audience, "General audience");
    }

    #[test]
    fn test_metadata_fallback() {
        let metadata = SongMetadata::parse("no json at all");
        assert_eq!(metadata, SongMetadata::default());
    }
}
