//! Competitor resolver
//!
//! Looks each competitor up across the known storage layouts in priority
//! order. Lookups for different competitors run concurrently; a failed or
//! timed-out lookup only marks that competitor as not found.

use crate::blob::BlobStore;
use crate::error::StorageError;
use crate::layout;
use cpg_model::{
    extract_profile, normalize_posts, CompetitorResolution, NormalizedPosts, Platform, Post,
    ProfileSnapshot, ResolvedCompetitor,
};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default per-competitor lookup budget
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Primary account data
#[derive(Debug, Clone, Default)]
pub struct PrimaryData {
    pub posts: Vec<Post>,
    pub profile: Option<ProfileSnapshot>,
    pub source_path: Option<String>,
}

impl PrimaryData {
    #[inline]
    #[must_use]
    pub fn has_posts(&self) -> bool {
        !self.posts.is_empty()
    }
}

/// Resolves competitor and primary post data from a [`BlobStore`]
#[derive(Clone)]
pub struct CompetitorResolver {
    store: Arc<dyn BlobStore>,
    lookup_timeout: Duration,
}

impl std::fmt::Debug for CompetitorResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompetitorResolver")
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}

impl CompetitorResolver {
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// With per-competitor lookup timeout
    #[inline]
    #[must_use]
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Resolve every competitor, preserving request order
    pub async fn resolve(
        &self,
        primary: &str,
        competitors: &[String],
        platform: Platform,
    ) -> CompetitorResolution {
        let lookups = competitors.iter().map(|competitor| async move {
            let outcome =
                tokio::time::timeout(self.lookup_timeout, self.resolve_one(primary, competitor, platform))
                    .await
                    .map_err(|_| StorageError::Timeout(self.lookup_timeout));

            let resolved = match outcome {
                Ok(resolved) => resolved,
                Err(error) => {
                    warn!(competitor = %competitor, %error, "competitor lookup failed; treating as not found");
                    ResolvedCompetitor::missing()
                }
            };
            (competitor.clone(), resolved)
        });

        let resolution: CompetitorResolution = join_all(lookups).await.into_iter().collect();

        info!(
            primary,
            platform = %platform,
            requested = resolution.len(),
            found = resolution.found_count(),
            "competitor resolution complete"
        );
        resolution
    }

    async fn resolve_one(
        &self,
        primary: &str,
        competitor: &str,
        platform: Platform,
    ) -> ResolvedCompetitor {
        for (source, path) in layout::competitor_candidates(platform, primary, competitor) {
            let raw = match self.store.get_json(&path).await {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(error) => {
                    warn!(competitor, path = %path, %error, "competitor read failed; trying next layout");
                    continue;
                }
            };

            match normalize_posts(&raw, competitor, true) {
                NormalizedPosts::Found(posts) => {
                    let resolved = ResolvedCompetitor::found(posts, path, source);
                    if resolved.is_non_canonical() {
                        warn!(
                            competitor,
                            path = resolved.source_path.as_deref().unwrap_or_default(),
                            priority = source.priority(),
                            "competitor data found under non-canonical layout"
                        );
                    } else {
                        debug!(competitor, priority = source.priority(), "competitor data found");
                    }
                    return resolved;
                }
                NormalizedPosts::Empty => debug!(competitor, path = %path, "no posts at path"),
                NormalizedPosts::SchemaMismatch(_) => {
                    warn!(competitor, path = %path, "unrecognised document shape; skipping");
                }
            }
        }

        debug!(competitor, "no data under any layout");
        ResolvedCompetitor::missing()
    }

    /// Load the primary account's posts and profile
    ///
    /// Storage failures are logged and yield empty data, which routes the
    /// request into the zero-data fallback.
    pub async fn load_primary(&self, primary: &str, platform: Platform) -> PrimaryData {
        let mut data = PrimaryData::default();

        for path in layout::primary_candidates(platform, primary) {
            let raw = match self.store.get_json(&path).await {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(error) => {
                    warn!(primary, path = %path, %error, "primary lookup failed");
                    continue;
                }
            };

            if data.profile.is_none() {
                data.profile = extract_profile(&raw, primary);
            }
            if let NormalizedPosts::Found(posts) = normalize_posts(&raw, primary, false) {
                data.posts = posts;
                data.source_path = Some(path);
                break;
            }
        }

        if data.profile.is_none() {
            let path = layout::competitor_path(
                cpg_model::LookupSource::Profile,
                platform,
                primary,
                primary,
            );
            if let Ok(Some(raw)) = self.store.get_json(&path).await {
                data.profile = extract_profile(&raw, primary);
            }
        }

        info!(primary, posts = data.posts.len(), "primary data loaded");
        data
    }
}
