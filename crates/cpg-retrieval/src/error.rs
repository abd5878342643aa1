//! Retrieval error types

/// Retrieval index failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetrievalError {
    /// Query text was empty or whitespace
    #[error("query text must not be empty")]
    EmptyQuery,

    /// Embedding backend failed
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// Index backend failed
    #[error("index backend error: {0}")]
    Backend(String),
}

/// Result alias for retrieval operations
pub type Result<T> = std::result::Result<T, RetrievalError>;
