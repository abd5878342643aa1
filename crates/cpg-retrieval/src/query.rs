//! Query and result types

use crate::error::{Result, RetrievalError};
use chrono::{DateTime, Utc};
use cpg_model::Post;
use serde::Serialize;
use std::fmt;

/// Non-empty query text
///
/// Empty queries return unranked results, so they are rejected at
/// construction instead of reaching the index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryText(String);

impl QueryText {
    /// # Errors
    /// `RetrievalError::EmptyQuery` for blank text.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(RetrievalError::EmptyQuery);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for QueryText {
    type Error = RetrievalError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

/// Metadata filter; `None` fields match anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    pub username: Option<String>,
    pub is_competitor: Option<bool>,
}

impl QueryFilter {
    /// Match everything
    #[inline]
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Posts by one competitor
    #[must_use]
    pub fn competitor(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            is_competitor: Some(true),
        }
    }

    /// The primary account's own posts
    #[must_use]
    pub fn own(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            is_competitor: Some(false),
        }
    }

    /// Does a partition key satisfy this filter
    #[must_use]
    pub fn matches(&self, username: &str, is_competitor: bool) -> bool {
        self.username.as_deref().map_or(true, |u| u == username)
            && self.is_competitor.map_or(true, |c| c == is_competitor)
    }
}

/// Metadata stored alongside each indexed post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    pub id: String,
    pub username: String,
    pub is_competitor: bool,
    pub engagement: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub hashtags: Vec<String>,
}

impl From<&Post> for DocumentMetadata {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id().to_string(),
            username: post.username().to_string(),
            is_competitor: post.is_competitor(),
            engagement: post.engagement(),
            timestamp: post.timestamp(),
            hashtags: post.hashtags().iter().cloned().collect(),
        }
    }
}

/// One ranked query result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedDocument {
    pub document: String,
    pub metadata: DocumentMetadata,
    /// Cosine similarity to the query
    pub score: f32,
}
