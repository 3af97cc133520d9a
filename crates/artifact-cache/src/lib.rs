//! LRU cache of file-backed artifacts
//!
//! Wraps an [`lru_index::LruIndex`] so that values are paths to externally
//! stored files and every entry that leaves the index — evicted, removed, or
//! purged — is handed to a release function that cleans up the backing file.
//! The index never owns the files; release failures are logged, not
//! propagated, so index consistency stays authoritative.

mod cache;
mod types;

pub use cache::{release_file, ArtifactCache};
pub use lru_index::InvalidCapacity;
pub use types::CacheStats;
