//! Blob storage capability
//!
//! Paths are `/`-separated keys relative to the store root. Two backends:
//! - [`MemoryBlobStore`]: concurrent in-memory map, used by tests and batch runs
//! - [`FsBlobStore`]: JSON files under a root directory

use crate::error::{Result, StorageError};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};

/// JSON blob storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read a document; `Ok(None)` when nothing is stored at `path`
    async fn get_json(&self, path: &str) -> Result<Option<Value>>;

    /// Write a document, replacing any previous one
    async fn put_json(&self, path: &str, value: &Value) -> Result<bool>;

    /// All stored paths starting with `prefix`, sorted
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// In-memory blob store
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, Value>,
}

impl MemoryBlobStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document synchronously
    pub fn insert(&self, path: impl Into<String>, value: Value) {
        self.blobs.insert(path.into(), value);
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.blobs.contains_key(path)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get_json(&self, path: &str) -> Result<Option<Value>> {
        Ok(self.blobs.get(path).map(|v| v.value().clone()))
    }

    async fn put_json(&self, path: &str, value: &Value) -> Result<bool> {
        self.blobs.insert(path.to_string(), value.clone());
        Ok(true)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut paths: Vec<String> = self
            .blobs
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect();
        paths.sort();
        Ok(paths)
    }
}

/// Filesystem blob store rooted at a directory
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let rel = Path::new(key);
        if key.is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(StorageError::InvalidPath(key.to_string()));
        }
        Ok(self.root.join(rel))
    }

    fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
        move |source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get_json(&self, path: &str) -> Result<Option<Value>> {
        let full = self.resolve(path)?;
        let bytes = match tokio::fs::read(&full).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_err(&full)(e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StorageError::InvalidJson {
                path: path.to_string(),
                source,
            })
    }

    async fn put_json(&self, path: &str, value: &Value) -> Result<bool> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(Self::io_err(parent))?;
        }
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| StorageError::InvalidJson {
            path: path.to_string(),
            source,
        })?;
        tokio::fs::write(&full, bytes)
            .await
            .map_err(Self::io_err(&full))?;
        Ok(true)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut out = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(Self::io_err(&dir)(e)),
            };
            while let Some(entry) = entries.next_entry().await.map_err(Self::io_err(&dir))? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(Self::io_err(&path))?;
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(rel) = path.strip_prefix(&self.root) else {
                    continue;
                };
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(prefix) {
                    out.push(key);
                }
            }
        }

        out.sort();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn memory_store_roundtrip_and_list() {
        let store = MemoryBlobStore::new();
        store.put_json("twitter/sama.json", &json!([1])).await.unwrap();
        store.insert("instagram/a/a.json", json!([]));

        assert_eq!(store.get_json("twitter/sama.json").await.unwrap(), Some(json!([1])));
        assert_eq!(store.get_json("twitter/nobody.json").await.unwrap(), None);
        assert_eq!(store.list("twitter/").await.unwrap(), vec!["twitter/sama.json"]);
    }

    #[tokio::test]
    async fn fs_store_creates_parents_and_lists_nested() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        store
            .put_json("content_plans/twitter/ylecun/content_plan.json", &json!({ "ok": true }))
            .await
            .unwrap();
        store.put_json("twitter/ylecun.json", &json!([])).await.unwrap();

        let got = store
            .get_json("content_plans/twitter/ylecun/content_plan.json")
            .await
            .unwrap();
        assert_eq!(got, Some(json!({ "ok": true })));
        assert_eq!(
            store.list("content_plans/").await.unwrap(),
            vec!["content_plans/twitter/ylecun/content_plan.json"]
        );
        assert_eq!(store.list("").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn fs_store_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        assert_eq!(store.get_json("instagram/x.json").await.unwrap(), None);
    }

    #[tokio::test]
    async fn fs_store_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        let err = store.get_json("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn fs_store_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), b"{not json").unwrap();
        let store = FsBlobStore::new(dir.path());
        let err = store.get_json("broken.json").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidJson { .. }));
        assert!(!err.is_retryable());
    }
}
