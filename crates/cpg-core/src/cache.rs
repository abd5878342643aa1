//! Request-scoped caches
//!
//! One [`RequestCache`] is created per pipeline invocation and handed to the
//! components that cache retrieval results and generation output. The retry
//! controller calls [`RequestCache::invalidate`] before every retry so a
//! retry never replays a cached failing response.

use cpg_retrieval::{QueryFilter, QueryText, RetrievedDocument};
use moka::future::Cache;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Which cache to invalidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheScope {
    Retrieval,
    Generation,
    All,
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub retrieval_entries: u64,
    pub generation_entries: u64,
    /// Number of invalidations performed
    pub epoch: u64,
}

/// Explicit cache handle for one pipeline invocation
#[derive(Debug, Clone)]
pub struct RequestCache {
    retrieval: Cache<String, Arc<Vec<RetrievedDocument>>>,
    generation: Cache<String, Arc<Value>>,
    epoch: Arc<AtomicU64>,
}

impl RequestCache {
    /// Create caches with max capacity and time-to-live
    #[must_use]
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            retrieval: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            generation: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Key for a retrieval query
    #[must_use]
    pub fn retrieval_key(text: &QueryText, n_results: usize, filter: &QueryFilter) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(text.as_str().as_bytes());
        hasher.update(&n_results.to_le_bytes());
        hasher.update(filter.username.as_deref().unwrap_or("*").as_bytes());
        hasher.update(match filter.is_competitor {
            Some(true) => b"c",
            Some(false) => b"o",
            None => b"*",
        });
        hasher.finalize().to_hex().to_string()
    }

    /// Key for a generation request
    #[must_use]
    pub fn generation_key(module: &str, prompt_context: &Value) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(module.as_bytes());
        hasher.update(&[0]);
        hasher.update(prompt_context.to_string().as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    pub async fn get_retrieval(&self, key: &str) -> Option<Arc<Vec<RetrievedDocument>>> {
        self.retrieval.get(key).await
    }

    pub async fn insert_retrieval(&self, key: String, docs: Vec<RetrievedDocument>) {
        self.retrieval.insert(key, Arc::new(docs)).await;
    }

    pub async fn get_generation(&self, key: &str) -> Option<Arc<Value>> {
        self.generation.get(key).await
    }

    pub async fn insert_generation(&self, key: String, value: Value) {
        self.generation.insert(key, Arc::new(value)).await;
    }

    /// Drop every entry in `scope`
    pub async fn invalidate(&self, scope: CacheScope) {
        if matches!(scope, CacheScope::Retrieval | CacheScope::All) {
            self.retrieval.invalidate_all();
            self.retrieval.run_pending_tasks().await;
        }
        if matches!(scope, CacheScope::Generation | CacheScope::All) {
            self.generation.invalidate_all();
            self.generation.run_pending_tasks().await;
        }
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Invalidations so far
    #[inline]
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            retrieval_entries: self.retrieval.entry_count(),
            generation_entries: self.generation.entry_count(),
            epoch: self.epoch(),
        }
    }
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new(1_000, Duration::from_secs(3_600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn invalidate_clears_only_the_scope() {
        let cache = RequestCache::default();
        let gen_key = RequestCache::generation_key("next_post_prediction", &json!({ "a": 1 }));
        let query = QueryText::new("ai").unwrap();
        let ret_key = RequestCache::retrieval_key(&query, 5, &QueryFilter::any());

        cache.insert_generation(gen_key.clone(), json!({ "caption": "x" })).await;
        cache.insert_retrieval(ret_key.clone(), Vec::new()).await;

        cache.invalidate(CacheScope::Generation).await;
        assert!(cache.get_generation(&gen_key).await.is_none());
        assert!(cache.get_retrieval(&ret_key).await.is_some());

        cache.invalidate(CacheScope::All).await;
        assert!(cache.get_retrieval(&ret_key).await.is_none());
        assert_eq!(cache.epoch(), 2);
    }

    #[test]
    fn keys_depend_on_every_input() {
        let q = QueryText::new("ai").unwrap();
        let a = RequestCache::retrieval_key(&q, 5, &QueryFilter::competitor("sama"));
        let b = RequestCache::retrieval_key(&q, 5, &QueryFilter::own("sama"));
        let c = RequestCache::retrieval_key(&q, 6, &QueryFilter::competitor("sama"));
        assert_ne!(a, b);
        assert_ne!(a, c);

        let g1 = RequestCache::generation_key("recommendation", &json!({ "attempt": 1 }));
        let g2 = RequestCache::generation_key("recommendation", &json!({ "attempt": 2 }));
        assert_ne!(g1, g2);
    }
}
