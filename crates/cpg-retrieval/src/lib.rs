//! CPG Retrieval - post retrieval index
//!
//! Provides:
//! - [`RetrievalIndex`]: `index(posts, owner, is_competitor)` / `query(text, n, filter)`
//! - [`InMemoryIndex`]: partitioned, lock-per-account implementation
//! - [`Embedder`] and the [`HashingEmbedder`] default
//! - [`QueryText`]: query text that cannot be empty

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod embed;
pub mod error;
pub mod index;
pub mod query;

pub use embed::{cosine, Embedder, HashingEmbedder, DEFAULT_DIMENSIONS};
pub use error::{Result, RetrievalError};
pub use index::{InMemoryIndex, RetrievalIndex};
pub use query::{DocumentMetadata, QueryFilter, QueryText, RetrievedDocument};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
