//! Storage error types

use std::path::PathBuf;

/// Blob storage failures
///
/// Callers treat these as per-item failures: one failed read marks that item
/// as not found and never aborts sibling lookups.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Underlying I/O failure
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored bytes are not valid JSON
    #[error("invalid json at {path}: {source}")]
    InvalidJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Path escapes the store root or is otherwise malformed
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Lookup exceeded its time budget
    #[error("lookup timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Backend-specific failure
    #[error("backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Whether a retry of the same operation could succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Timeout(_) | Self::Backend(_))
    }
}

/// Result alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
