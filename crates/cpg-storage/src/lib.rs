//! CPG Storage - blob storage and competitor data resolution
//!
//! Provides:
//! - [`BlobStore`]: `get_json` / `put_json` / `list` capability
//! - [`MemoryBlobStore`] and [`FsBlobStore`] backends
//! - [`layout`]: every storage key the pipeline reads or writes
//! - [`CompetitorResolver`]: priority-ordered, failure-isolated lookups

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod blob;
pub mod error;
pub mod layout;
pub mod resolver;

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use error::{Result, StorageError};
pub use resolver::{CompetitorResolver, PrimaryData, DEFAULT_LOOKUP_TIMEOUT};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
