//! Competitor resolution results
//!
//! Built once per pipeline run by the resolver and read-only afterwards.

use crate::post::Post;
use indexmap::IndexMap;
use serde::Serialize;

/// Which storage layout satisfied a competitor lookup, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupSource {
    /// `{platform}/{primary}/{competitor}.json`
    Colocated,
    /// `{platform}/{competitor}/{competitor}.json`
    OwnNamespace,
    /// `{platform}/{competitor}.json`
    Flat,
    /// Platform-agnostic profile namespace
    Profile,
}

impl LookupSource {
    /// Lookup order
    pub const ORDER: [LookupSource; 4] = [
        LookupSource::Colocated,
        LookupSource::OwnNamespace,
        LookupSource::Flat,
        LookupSource::Profile,
    ];

    /// 1-based priority
    #[inline]
    #[must_use]
    pub fn priority(&self) -> u8 {
        match self {
            Self::Colocated => 1,
            Self::OwnNamespace => 2,
            Self::Flat => 3,
            Self::Profile => 4,
        }
    }

    /// Only the co-located layout is canonical
    #[inline]
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        matches!(self, Self::Colocated)
    }
}

/// Resolved data for one competitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCompetitor {
    pub posts: Vec<Post>,
    pub source_path: Option<String>,
    pub source: Option<LookupSource>,
    pub found: bool,
}

impl ResolvedCompetitor {
    /// Posts found at `source_path`
    #[must_use]
    pub fn found(posts: Vec<Post>, source_path: impl Into<String>, source: LookupSource) -> Self {
        Self {
            found: !posts.is_empty(),
            posts,
            source_path: Some(source_path.into()),
            source: Some(source),
        }
    }

    /// No data at any path
    #[must_use]
    pub fn missing() -> Self {
        Self {
            posts: Vec::new(),
            source_path: None,
            source: None,
            found: false,
        }
    }

    /// Data came from a non-canonical layout
    #[must_use]
    pub fn is_non_canonical(&self) -> bool {
        self.source.is_some_and(|s| !s.is_canonical())
    }

    /// Mean engagement, if any posts exist
    #[must_use]
    pub fn average_engagement(&self) -> Option<f64> {
        if self.posts.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let total: f64 = self.posts.iter().map(|p| p.engagement() as f64).sum();
        #[allow(clippy::cast_precision_loss)]
        Some(total / self.posts.len() as f64)
    }
}

/// Competitor handle → resolved data, in request order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompetitorResolution {
    entries: IndexMap<String, ResolvedCompetitor>,
}

impl CompetitorResolution {
    #[inline]
    #[must_use]
    pub fn get(&self, competitor: &str) -> Option<&ResolvedCompetitor> {
        self.entries.get(competitor)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResolvedCompetitor)> {
        self.entries.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of competitors with data
    #[must_use]
    pub fn found_count(&self) -> usize {
        self.entries.values().filter(|r| r.found).count()
    }

    /// At least one competitor has posts
    #[must_use]
    pub fn any_found(&self) -> bool {
        self.entries.values().any(|r| r.found)
    }

    /// All resolved competitor posts, in request order
    pub fn all_posts(&self) -> impl Iterator<Item = &Post> {
        self.entries.values().flat_map(|r| r.posts.iter())
    }
}

impl FromIterator<(String, ResolvedCompetitor)> for CompetitorResolution {
    fn from_iter<T: IntoIterator<Item = (String, ResolvedCompetitor)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
