//! Trend topic extraction
//!
//! Maps a timestamped engagement series to ranked topic strings. The
//! percentile analyzer keeps the top quartile of posts by engagement and
//! ranks their hashtags, falling back to caption keywords when no hashtags
//! exist.

use cpg_model::EngagementPoint;
use std::collections::HashMap;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "your", "you", "our", "are", "was",
    "have", "has", "will", "just", "about", "what", "when", "who", "how", "all", "new", "more",
    "out", "not", "but", "can", "its", "it's", "they", "them", "their", "there",
];

/// Topic extraction from engagement history
pub trait TrendAnalyzer: Send + Sync {
    /// Up to `top_n` topics, strongest first
    fn trending_topics(&self, series: &[EngagementPoint], top_n: usize) -> Vec<String>;
}

/// Ranks topics of posts at or above an engagement percentile
#[derive(Debug, Clone, Copy)]
pub struct PercentileTrendAnalyzer {
    percentile: f64,
}

impl PercentileTrendAnalyzer {
    /// `percentile` is clamped to `0.0..=1.0`
    #[must_use]
    pub fn new(percentile: f64) -> Self {
        Self {
            percentile: percentile.clamp(0.0, 1.0),
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn threshold(&self, series: &[EngagementPoint]) -> u64 {
        let mut values: Vec<u64> = series.iter().map(|p| p.engagement).collect();
        values.sort_unstable();
        let rank = (self.percentile * (values.len() - 1) as f64).round() as usize;
        values[rank.min(values.len() - 1)]
    }
}

impl Default for PercentileTrendAnalyzer {
    fn default() -> Self {
        Self::new(0.75)
    }
}

impl TrendAnalyzer for PercentileTrendAnalyzer {
    fn trending_topics(&self, series: &[EngagementPoint], top_n: usize) -> Vec<String> {
        if series.is_empty() || top_n == 0 {
            return Vec::new();
        }
        let threshold = self.threshold(series);
        let top: Vec<&EngagementPoint> = series.iter().filter(|p| p.engagement >= threshold).collect();

        let mut weights: HashMap<String, u64> = HashMap::new();
        for point in &top {
            for tag in &point.hashtags {
                *weights.entry(tag.clone()).or_default() += point.engagement.max(1);
            }
        }
        if weights.is_empty() {
            for point in &top {
                for word in keywords(&point.text) {
                    *weights.entry(word).or_default() += point.engagement.max(1);
                }
            }
        }

        let mut ranked: Vec<(String, u64)> = weights.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.into_iter().take(top_n).map(|(topic, _)| topic).collect()
    }
}

fn keywords(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= 4 && !STOPWORDS.contains(&w.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn point(day: u32, engagement: u64, tags: &[&str], text: &str) -> EngagementPoint {
        EngagementPoint {
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
            engagement,
            hashtags: tags.iter().map(ToString::to_string).collect(),
            text: text.to_string(),
        }
    }

    #[test]
    fn ranks_hashtags_of_top_quartile() {
        let series = vec![
            point(1, 10, &["boring"], ""),
            point(2, 20, &["meh"], ""),
            point(3, 900, &["aisafety", "research"], ""),
            point(4, 1000, &["aisafety"], ""),
            point(5, 15, &["filler"], ""),
        ];
        let topics = PercentileTrendAnalyzer::default().trending_topics(&series, 3);
        assert_eq!(topics, vec!["aisafety", "research"]);
    }

    #[test]
    fn falls_back_to_keywords() {
        let series = vec![point(1, 50, &[], "Backpropagation still matters for learning")];
        let topics = PercentileTrendAnalyzer::default().trending_topics(&series, 2);
        assert_eq!(topics, vec!["backpropagation", "learning"]);
    }

    #[test]
    fn empty_series_has_no_topics() {
        assert!(PercentileTrendAnalyzer::default().trending_topics(&[], 3).is_empty());
    }
}
