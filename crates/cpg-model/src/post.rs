//! Social post model
//!
//! A [`Post`] is immutable once built. Engagement is always derived from
//! likes and comments and is never stored on its own.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

static HASHTAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([\p{L}\p{N}_]+)").expect("hashtag pattern is valid"));

/// A single scraped post, own or competitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    id: String,
    text: String,
    hashtags: BTreeSet<String>,
    likes: u64,
    comments: u64,
    timestamp: Option<DateTime<Utc>>,
    username: String,
    is_competitor: bool,
}

impl Post {
    /// Create a post with no engagement and no hashtags beyond those in `text`
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let hashtags = extract_hashtags(&text);
        Self {
            id: id.into(),
            text,
            hashtags,
            likes: 0,
            comments: 0,
            timestamp: None,
            username: username.into(),
            is_competitor: false,
        }
    }

    /// With like count
    #[inline]
    #[must_use]
    pub fn with_likes(mut self, likes: u64) -> Self {
        self.likes = likes;
        self
    }

    /// With comment count
    #[inline]
    #[must_use]
    pub fn with_comments(mut self, comments: u64) -> Self {
        self.comments = comments;
        self
    }

    /// With publication time
    #[inline]
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Add explicit hashtags (leading `#` optional, stored lowercase)
    #[must_use]
    pub fn with_hashtags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.hashtags
            .extend(tags.into_iter().filter_map(|t| normalize_tag(t.as_ref())));
        self
    }

    /// Mark as competitor content
    #[inline]
    #[must_use]
    pub fn as_competitor(mut self, is_competitor: bool) -> Self {
        self.is_competitor = is_competitor;
        self
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    #[must_use]
    pub fn hashtags(&self) -> &BTreeSet<String> {
        &self.hashtags
    }

    #[inline]
    #[must_use]
    pub fn likes(&self) -> u64 {
        self.likes
    }

    #[inline]
    #[must_use]
    pub fn comments(&self) -> u64 {
        self.comments
    }

    /// Likes plus comments
    #[inline]
    #[must_use]
    pub fn engagement(&self) -> u64 {
        self.likes.saturating_add(self.comments)
    }

    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    #[inline]
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[inline]
    #[must_use]
    pub fn is_competitor(&self) -> bool {
        self.is_competitor
    }

    /// Timestamped engagement sample, if the post carries a timestamp
    #[must_use]
    pub fn engagement_point(&self) -> Option<EngagementPoint> {
        self.timestamp.map(|timestamp| EngagementPoint {
            timestamp,
            engagement: self.engagement(),
            hashtags: self.hashtags.iter().cloned().collect(),
            text: self.text.clone(),
        })
    }
}

/// One sample of an engagement time series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngagementPoint {
    pub timestamp: DateTime<Utc>,
    pub engagement: u64,
    pub hashtags: Vec<String>,
    pub text: String,
}

/// Build the engagement series for a set of posts, oldest first
#[must_use]
pub fn engagement_series(posts: &[Post]) -> Vec<EngagementPoint> {
    let mut series: Vec<EngagementPoint> = posts.iter().filter_map(Post::engagement_point).collect();
    series.sort_by_key(|p| p.timestamp);
    series
}

/// Extract `#tags` from free text, lowercased and without the `#`
#[must_use]
pub fn extract_hashtags(text: &str) -> BTreeSet<String> {
    HASHTAG_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .filter_map(|m| normalize_tag(m.as_str()))
        .collect()
}

fn normalize_tag(tag: &str) -> Option<String> {
    let tag = tag.trim().trim_start_matches('#');
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_lowercase())
    }
}
