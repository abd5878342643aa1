//! Retrieval index
//!
//! Documents are partitioned by `(username, is_competitor)`. Each partition
//! sits behind its own async `RwLock`, so:
//! - indexing one account never blocks queries on another
//! - a query for an account waits for an in-flight write on that account

use crate::embed::{cosine, Embedder, HashingEmbedder};
use crate::error::Result;
use crate::query::{DocumentMetadata, QueryFilter, QueryText, RetrievedDocument};
use async_trait::async_trait;
use cpg_model::Post;
use dashmap::DashMap;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Post retrieval capability
#[async_trait]
pub trait RetrievalIndex: Send + Sync {
    /// Index posts under `(owner, is_competitor)`; re-indexing an id replaces it
    async fn index(&self, posts: &[Post], owner: &str, is_competitor: bool) -> Result<usize>;

    /// Ranked documents most similar to `text` that satisfy `filter`
    async fn query(
        &self,
        text: &QueryText,
        n_results: usize,
        filter: &QueryFilter,
    ) -> Result<Vec<RetrievedDocument>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PartitionKey {
    username: String,
    is_competitor: bool,
}

#[derive(Debug, Clone)]
struct IndexedDocument {
    document: String,
    metadata: DocumentMetadata,
    embedding: Vec<f32>,
}

type Partition = Arc<RwLock<IndexMap<String, IndexedDocument>>>;

/// In-process retrieval index
pub struct InMemoryIndex {
    partitions: DashMap<PartitionKey, Partition>,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for InMemoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIndex")
            .field("partitions", &self.partitions.len())
            .field("dimensions", &self.embedder.dimensions())
            .finish()
    }
}

impl InMemoryIndex {
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            partitions: DashMap::new(),
            embedder,
        }
    }

    /// Number of documents indexed for one partition
    pub async fn partition_len(&self, username: &str, is_competitor: bool) -> usize {
        let key = PartitionKey {
            username: username.to_string(),
            is_competitor,
        };
        let Some(partition) = self.partitions.get(&key).map(|p| Arc::clone(p.value())) else {
            return 0;
        };
        let len = partition.read().await.len();
        len
    }

    fn partition(&self, key: PartitionKey) -> Partition {
        Arc::clone(self.partitions.entry(key).or_default().value())
    }

    fn matching_partitions(&self, filter: &QueryFilter) -> Vec<Partition> {
        self.partitions
            .iter()
            .filter(|e| filter.matches(&e.key().username, e.key().is_competitor))
            .map(|e| Arc::clone(e.value()))
            .collect()
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new(Arc::new(HashingEmbedder::default()))
    }
}

#[async_trait]
impl RetrievalIndex for InMemoryIndex {
    async fn index(&self, posts: &[Post], owner: &str, is_competitor: bool) -> Result<usize> {
        let mut prepared = Vec::with_capacity(posts.len());
        for post in posts {
            let document = post.text().to_string();
            let embedding = self.embedder.embed(&document)?;
            let mut metadata = DocumentMetadata::from(post);
            metadata.username = owner.to_string();
            metadata.is_competitor = is_competitor;
            prepared.push(IndexedDocument {
                document,
                metadata,
                embedding,
            });
        }

        let partition = self.partition(PartitionKey {
            username: owner.to_string(),
            is_competitor,
        });
        let mut docs = partition.write().await;
        let count = prepared.len();
        for doc in prepared {
            docs.insert(doc.metadata.id.clone(), doc);
        }

        debug!(owner, is_competitor, count, total = docs.len(), "indexed posts");
        Ok(count)
    }

    async fn query(
        &self,
        text: &QueryText,
        n_results: usize,
        filter: &QueryFilter,
    ) -> Result<Vec<RetrievedDocument>> {
        if n_results == 0 {
            return Ok(Vec::new());
        }
        let query = self.embedder.embed(text.as_str())?;

        let mut scored = Vec::new();
        for partition in self.matching_partitions(filter) {
            let docs = partition.read().await;
            scored.extend(docs.values().map(|doc| RetrievedDocument {
                document: doc.document.clone(),
                metadata: doc.metadata.clone(),
                score: cosine(&query, &doc.embedding),
            }));
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.metadata.engagement.cmp(&a.metadata.engagement))
                .then_with(|| a.metadata.id.cmp(&b.metadata.id))
        });
        scored.truncate(n_results);

        debug!(query = %text, n_results, returned = scored.len(), "retrieval query");
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn q(s: &str) -> QueryText {
        QueryText::new(s).unwrap()
    }

    #[tokio::test]
    async fn query_respects_filter_and_ranking() {
        let index = InMemoryIndex::default();
        index
            .index(
                &[
                    Post::new("h1", "geoffreyhinton", "Neural networks learn representations"),
                    Post::new("h2", "geoffreyhinton", "AI safety deserves serious research"),
                ],
                "geoffreyhinton",
                false,
            )
            .await
            .unwrap();
        index
            .index(
                &[Post::new("s1", "sama", "AI research at scale").as_competitor(true)],
                "sama",
                true,
            )
            .await
            .unwrap();

        let own = index
            .query(&q("ai safety research"), 5, &QueryFilter::own("geoffreyhinton"))
            .await
            .unwrap();
        assert_eq!(own.len(), 2);
        assert_eq!(own[0].metadata.id, "h2");

        let sama = index
            .query(&q("research"), 5, &QueryFilter::competitor("sama"))
            .await
            .unwrap();
        assert_eq!(sama.len(), 1);
        assert!(sama[0].metadata.is_competitor);

        let all = index.query(&q("research"), 1, &QueryFilter::any()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn reindexing_same_id_replaces() {
        let index = InMemoryIndex::default();
        let post = Post::new("1", "netflix", "New season drops friday");
        index.index(&[post.clone()], "netflix", false).await.unwrap();
        index.index(&[post], "netflix", false).await.unwrap();
        assert_eq!(index.partition_len("netflix", false).await, 1);
        assert_eq!(index.partition_len("netflix", true).await, 0);
    }

    #[tokio::test]
    async fn concurrent_indexing_of_distinct_accounts() {
        let index = Arc::new(InMemoryIndex::default());
        let tasks: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|owner| {
                let index = Arc::clone(&index);
                tokio::spawn(async move {
                    let posts: Vec<Post> = (0..20)
                        .map(|i| Post::new(format!("{owner}{i}"), owner, format!("post number {i}")))
                        .collect();
                    index.index(&posts, owner, true).await
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), 20);
        }
        assert_eq!(index.partition_len("b", true).await, 20);
    }
}
