//! Audit rule set
//!
//! Thresholds and word lists are data so deployments can tune them without
//! touching the checks.

use serde::{Deserialize, Serialize};

/// Configurable audit thresholds and word lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditRules {
    /// Minimum trimmed caption / tweet length
    pub min_caption_chars: usize,
    /// Minimum trimmed image prompt length
    pub min_image_prompt_chars: usize,
    /// Minimum number of improvement recommendations
    pub min_recommendations: usize,
    /// Boilerplate phrases that mark a recommendation as templated
    pub template_phrases: Vec<String>,
    /// Suffixes that make `#{username}{suffix}` a hard-coded hashtag
    pub hardcoded_suffixes: Vec<String>,
    /// Domain-relevance keywords; a hashtag containing one is contextual
    pub contextual_keywords: Vec<String>,
    /// Relevance is only required above this many hashtags
    pub contextual_min_hashtags: usize,
}

impl Default for AuditRules {
    fn default() -> Self {
        Self {
            min_caption_chars: 10,
            min_image_prompt_chars: 20,
            min_recommendations: 3,
            template_phrases: strings(&[
                "see some fascinating",
                "outshine them by",
                "become the leading voice",
            ]),
            hardcoded_suffixes: strings(&["love", "beauty", "style"]),
            contextual_keywords: strings(&[
                "summer",
                "winter",
                "spring",
                "fall",
                "collection",
                "new",
                "trending",
                "glow",
                "beauty",
                "makeup",
                "skin",
                "care",
                "health",
                "fitness",
                "tech",
                "ai",
                "innovation",
                "research",
                "science",
                "data",
                "entertainment",
                "movie",
                "show",
                "series",
                "film",
                "content",
            ]),
            contextual_min_hashtags: 2,
        }
    }
}

impl AuditRules {
    /// First template phrase contained in `text`, case-insensitively
    #[must_use]
    pub fn template_phrase_in(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.template_phrases
            .iter()
            .map(String::as_str)
            .find(|p| lower.contains(&p.to_lowercase()))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_phrase_detection_ignores_case() {
        let rules = AuditRules::default();
        assert_eq!(
            rules.template_phrase_in("Become The Leading Voice in AI"),
            Some("become the leading voice")
        );
        assert_eq!(rules.template_phrase_in("Post twice a week"), None);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let rules: AuditRules = toml::from_str("min_recommendations = 5").unwrap();
        assert_eq!(rules.min_recommendations, 5);
        assert_eq!(rules.min_caption_chars, 10);
        assert_eq!(rules.hardcoded_suffixes.len(), 3);
    }
}
