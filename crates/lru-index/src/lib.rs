//! Fixed-capacity LRU index
//!
//! Maps comparable keys to opaque values, ordered by recency of access, with
//! an optional callback invoked once per entry that leaves the index (by
//! capacity eviction, explicit removal, or purge).
//!
//! The index is a bare data structure: it performs no I/O and no locking.
//! Callers sharing one across threads must guard every operation with a
//! single lock, because even lookups reorder internal state.

mod error;
mod index;

pub use error::InvalidCapacity;
pub use index::{EvictCallback, LruIndex};
