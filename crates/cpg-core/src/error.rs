//! Error types for the content-plan pipeline
//!
//! Taxonomy:
//! - Resolution gaps are not errors; they route into the zero-data fallback
//! - [`GenerationError`]: recovered per module with a flagged placeholder
//! - Validation violations drive the retry loop and are reported, not raised
//! - [`StorageError`]: isolated per item and logged
//! - Anything else is caught at the retry boundary as a terminal issue

use cpg_model::ModelError;
use cpg_retrieval::RetrievalError;
use cpg_storage::StorageError;
use std::path::PathBuf;
use std::time::Duration;

/// Main pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Caller input is structurally invalid
    #[error("invalid account context: {0}")]
    InvalidContext(#[from] ModelError),

    /// Storage read/write failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Retrieval index failed
    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Generative capability failed outside per-module recovery
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// `process(username)` found no account info document
    #[error("no account info for '{0}'")]
    AccountInfoMissing(String),

    /// Account info document is malformed
    #[error("invalid account info for '{username}': {reason}")]
    InvalidAccountInfo { username: String, reason: String },

    /// An attempt panicked
    #[error("attempt panicked: {0}")]
    Panicked(String),
}

impl PipelineError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_retryable(),
            Self::Generation(e) => e.is_retryable(),
            Self::Retrieval(RetrievalError::Backend(_) | RetrievalError::Embedding(_))
            | Self::Panicked(_) => true,
            _ => false,
        }
    }
}

/// Generative capability errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Model command could not be started
    #[error("failed to launch generator '{executable}': {reason}")]
    Launch { executable: String, reason: String },

    /// Model command exited unsuccessfully
    #[error("generator exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    /// Call exceeded its time budget
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    /// Response was not JSON
    #[error("response for {module} is not valid json: {reason}")]
    InvalidJson { module: String, reason: String },

    /// JSON did not match the module schema
    #[error("output for {module} does not match schema: {reason}")]
    SchemaMismatch { module: String, reason: String },

    /// Backend declined the request
    #[error("generator unavailable: {0}")]
    Unavailable(String),
}

impl GenerationError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Launch { .. })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parse but are unusable
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Result alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(PipelineError::Generation(GenerationError::Timeout(Duration::from_secs(5))).is_retryable());
        assert!(!PipelineError::Generation(GenerationError::Launch {
            executable: "gemini".into(),
            reason: "not found".into()
        })
        .is_retryable());
        assert!(!PipelineError::InvalidContext(ModelError::EmptyUsername).is_retryable());
        assert!(!PipelineError::Retrieval(RetrievalError::EmptyQuery).is_retryable());
    }
}
