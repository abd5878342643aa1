//! Topic query derivation
//!
//! Preference order: caller topics, then trend topics from the primary
//! engagement history, then the platform default. The result is a
//! [`QueryText`], so an empty query can never reach retrieval.

use crate::trends::TrendAnalyzer;
use cpg_model::{engagement_series, AccountContext, Post};
use cpg_retrieval::{QueryText, RetrievalError};

/// Where a topic query came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicSource {
    Caller,
    Trends,
    PlatformDefault,
}

/// Topic query plus its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicQuery {
    pub text: QueryText,
    pub topics: Vec<String>,
    pub source: TopicSource,
}

/// Derive the topic query for one assembly
///
/// # Errors
/// `RetrievalError::EmptyQuery` if every source is blank.
pub fn derive_topic_query(
    context: &AccountContext,
    primary_posts: &[Post],
    analyzer: &dyn TrendAnalyzer,
    top_n: usize,
    default_query: &str,
) -> Result<TopicQuery, RetrievalError> {
    let caller: Vec<String> = non_blank(&context.topics);
    if !caller.is_empty() {
        return build(caller, TopicSource::Caller);
    }

    let trends = non_blank(&analyzer.trending_topics(&engagement_series(primary_posts), top_n));
    if !trends.is_empty() {
        return build(trends, TopicSource::Trends);
    }

    build(vec![default_query.trim().to_string()], TopicSource::PlatformDefault)
}

fn non_blank(topics: &[String]) -> Vec<String> {
    topics
        .iter()
        .map(|t| t.trim().trim_start_matches('#').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn build(topics: Vec<String>, source: TopicSource) -> Result<TopicQuery, RetrievalError> {
    Ok(TopicQuery {
        text: QueryText::new(topics.join(" "))?,
        topics,
        source,
    })
}
