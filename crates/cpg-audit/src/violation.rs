//! Audit violations
//!
//! The `Display` text of each variant is the issue string recorded in
//! validation reports and exported plans.

use serde::Serialize;
use std::collections::BTreeMap;

/// Broad class of a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Presence,
    Depth,
    Template,
    HardCoding,
    Relevance,
    Structure,
    Placeholder,
}

/// One failed quality check
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("MISSING: next_post_prediction module")]
    MissingNextPost,

    #[error("MISSING: next_post caption/tweet_text")]
    MissingCaption,

    #[error("POOR QUALITY: Caption too short ({0} chars)")]
    CaptionTooShort(usize),

    #[error("NEXT_POST: Missing or invalid hashtags array")]
    MissingHashtags,

    /// Hashtag mechanically derived from the username
    #[error("NEXT_POST: HARDCODED HASHTAG DETECTED: {0} (generic pattern)")]
    HardcodedHashtag(String),

    /// More than the threshold of hashtags and none contextual
    #[error("NEXT_POST: NO CONTEXTUAL HASHTAGS: All hashtags appear generic ([{}])", .0.join(", "))]
    NoContextualHashtags(Vec<String>),

    #[error("MISSING: next_post image_prompt")]
    MissingImagePrompt,

    #[error("POOR QUALITY: Image prompt too short")]
    ImagePromptTooShort,

    #[error("MISSING: improvement_recommendations module")]
    MissingImprovements,

    #[error("INSUFFICIENT: Only {found} recommendations (need at least {required})")]
    InsufficientRecommendations { found: usize, required: usize },

    /// Recommendation contains a known boilerplate phrase
    #[error("TEMPLATE RECOMMENDATION #{index}: {excerpt}...")]
    TemplateRecommendation { index: usize, excerpt: String },

    #[error("MISSING: competitor_analysis module")]
    MissingCompetitorAnalysis,

    #[error("MISMATCH: {analyzed} analyzed vs {expected} competitors listed")]
    CompetitorCountMismatch { analyzed: usize, expected: usize },

    #[error("MISSING: {0} analysis")]
    MissingCompetitorEntry(String),

    #[error("MISSING: {competitor} {field}")]
    MissingCompetitorField {
        competitor: String,
        field: &'static str,
    },

    #[error("MISSING: recommendation module")]
    MissingRecommendation,

    #[error("MISSING: competitive_intelligence in recommendation")]
    MissingCompetitiveIntelligence,

    #[error("PLATFORM MISMATCH: Expected {expected}, got {got}")]
    PlatformMismatch { expected: String, got: String },

    #[error("USERNAME MISMATCH: Expected {expected}, got {got}")]
    UsernameMismatch { expected: String, got: String },

    #[error("COMPETITOR MISMATCH: Expected {expected:?}, got {got:?}")]
    CompetitorMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },

    /// Module holds a stand-in substituted after a generation failure
    #[error("PLACEHOLDER: {0} was substituted after a generation failure")]
    PlaceholderModule(String),
}

impl Violation {
    #[must_use]
    pub fn kind(&self) -> ViolationKind {
        match self {
            Self::MissingNextPost
            | Self::MissingCaption
            | Self::MissingHashtags
            | Self::MissingImagePrompt
            | Self::MissingImprovements
            | Self::MissingCompetitorAnalysis
            | Self::MissingCompetitorEntry(_)
            | Self::MissingCompetitorField { .. }
            | Self::MissingRecommendation
            | Self::MissingCompetitiveIntelligence => ViolationKind::Presence,
            Self::CaptionTooShort(_)
            | Self::ImagePromptTooShort
            | Self::InsufficientRecommendations { .. } => ViolationKind::Depth,
            Self::TemplateRecommendation { .. } => ViolationKind::Template,
            Self::HardcodedHashtag(_) => ViolationKind::HardCoding,
            Self::NoContextualHashtags(_) => ViolationKind::Relevance,
            Self::CompetitorCountMismatch { .. }
            | Self::PlatformMismatch { .. }
            | Self::UsernameMismatch { .. }
            | Self::CompetitorMismatch { .. } => ViolationKind::Structure,
            Self::PlaceholderModule(_) => ViolationKind::Placeholder,
        }
    }
}

/// Number of violations of each kind
#[must_use]
pub fn count_by_kind(violations: &[Violation]) -> BTreeMap<ViolationKind, usize> {
    let mut counts = BTreeMap::new();
    for violation in violations {
        *counts.entry(violation.kind()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_group_by_kind() {
        let counts = count_by_kind(&[
            Violation::HardcodedHashtag("#netflixlove".into()),
            Violation::MissingImagePrompt,
            Violation::MissingRecommendation,
            Violation::PlaceholderModule("recommendation".into()),
        ]);
        assert_eq!(counts.get(&ViolationKind::Presence), Some(&2));
        assert_eq!(counts.get(&ViolationKind::HardCoding), Some(&1));
        assert_eq!(counts.get(&ViolationKind::Placeholder), Some(&1));
        assert_eq!(counts.get(&ViolationKind::Depth), None);
        assert_eq!(
            serde_json::to_value(&counts).unwrap(),
            serde_json::json!({ "presence": 2, "hard_coding": 1, "placeholder": 1 })
        );
    }

    #[test]
    fn issue_strings() {
        assert_eq!(
            Violation::HardcodedHashtag("#geoffreyhintonlove".into()).to_string(),
            "NEXT_POST: HARDCODED HASHTAG DETECTED: #geoffreyhintonlove (generic pattern)"
        );
        assert_eq!(
            Violation::NoContextualHashtags(vec!["#a".into(), "#b".into(), "#c".into()]).to_string(),
            "NEXT_POST: NO CONTEXTUAL HASHTAGS: All hashtags appear generic ([#a, #b, #c])"
        );
        assert_eq!(
            Violation::InsufficientRecommendations { found: 1, required: 3 }.to_string(),
            "INSUFFICIENT: Only 1 recommendations (need at least 3)"
        );
    }
}
