//! Write-through artifact cache over the LRU index

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru_index::{InvalidCapacity, LruIndex};
use tracing::{debug, warn};

use crate::types::CacheStats;

/// Maps artifact keys to the files holding their contents, bounded by entry
/// count, releasing the backing file of every entry that leaves the index.
///
/// The cache is not internally synchronized; concurrent callers must guard
/// every operation with one lock.
pub struct ArtifactCache {
    index: LruIndex<String, PathBuf>,
    hits: u64,
    misses: u64,
    evictions: Arc<AtomicU64>,
}

impl ArtifactCache {
    /// Create a cache that hands each departing `(key, path)` pair to
    /// `release`.
    ///
    /// `release` runs synchronously inside the operation that dropped the
    /// entry, before that operation returns to its caller. It must tolerate
    /// a path that no longer exists.
    pub fn new<F>(capacity: usize, mut release: F) -> Result<Self, InvalidCapacity>
    where
        F: FnMut(&str, &Path) + Send + 'static,
    {
        let evictions = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&evictions);
        let index = LruIndex::with_evict(
            capacity,
            Box::new(move |key: &String, path: &PathBuf| {
                counter.fetch_add(1, Ordering::Relaxed);
                release(key.as_str(), path.as_path());
            }),
        )?;
        Ok(Self {
            index,
            hits: 0,
            misses: 0,
            evictions,
        })
    }

    /// Create a cache whose release function deletes the backing file.
    pub fn with_file_release(capacity: usize) -> Result<Self, InvalidCapacity> {
        Self::new(capacity, release_file)
    }

    /// Path for `key`, promoting the entry to most recently used.
    pub fn lookup(&mut self, key: &str) -> Option<&Path> {
        match self.index.get(key) {
            Some(path) => {
                self.hits += 1;
                Some(path.as_path())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert `path` under `key`.
    ///
    /// If this pushes an older entry out, its file has already been released
    /// by the time `store` returns. Returns whether an eviction happened.
    pub fn store(&mut self, key: String, path: PathBuf) -> bool {
        self.index.add(key, path)
    }

    /// Whether `key` is cached; no recency side effect.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains(key)
    }

    /// Drop `key`, releasing its file. Returns whether anything was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.index.remove(key)
    }

    /// Drop `key` after its backing file proved unusable, reclassifying the
    /// hit recorded by the preceding `lookup` as a miss.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let removed = self.index.remove(key);
        if removed {
            self.hits = self.hits.saturating_sub(1);
            self.misses += 1;
        }
        removed
    }

    /// Drop every entry, releasing each file.
    pub fn purge(&mut self) {
        self.index.purge();
    }

    /// Number of cached artifacts.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the cache holds no artifacts.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Current cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.index.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Delete the file backing a released cache entry.
///
/// A file that is already gone is not an error; any other failure is logged
/// and swallowed, since the entry has already left the index.
pub fn release_file(key: &str, path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(key = %key, path = ?path, "Removed released artifact"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(key = %key, path = ?path, error = %e, "Failed to remove released artifact"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn write_artifact(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, name.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(ArtifactCache::with_file_release(0).is_err());
    }

    #[test]
    fn test_store_and_lookup() {
        let dir = tempdir().unwrap();
        let mut cache = ArtifactCache::with_file_release(4).unwrap();

        let path = write_artifact(dir.path(), "a.jpeg");
        assert!(!cache.store("a".to_string(), path.clone()));

        assert_eq!(cache.lookup("a"), Some(path.as_path()));
        assert_eq!(cache.lookup("missing"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_deletes_file_before_store_returns() {
        let dir = tempdir().unwrap();
        let mut cache = ArtifactCache::with_file_release(1).unwrap();

        let p1 = write_artifact(dir.path(), "k1.jpeg");
        let p2 = write_artifact(dir.path(), "k2.jpeg");

        cache.store("k1".to_string(), p1.clone());
        let evicted = cache.store("k2".to_string(), p2.clone());

        assert!(evicted);
        assert!(!p1.exists());
        assert!(p2.exists());
        assert_eq!(cache.lookup("k1"), None);
        assert_eq!(cache.lookup("k2"), Some(p2.as_path()));
    }

    #[test]
    fn test_injected_release_sees_evicted_pair() {
        let released: Arc<Mutex<Vec<(String, PathBuf)>>> = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&released);

        let mut cache = ArtifactCache::new(1, move |key: &str, path: &Path| {
            log.lock().unwrap().push((key.to_string(), path.to_path_buf()));
        })
        .unwrap();

        cache.store("k1".to_string(), PathBuf::from("/tmp/p1"));
        cache.store("k2".to_string(), PathBuf::from("/tmp/p2"));

        let log = released.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0], ("k1".to_string(), PathBuf::from("/tmp/p1")));
    }

    #[test]
    fn test_stateful_release_closure() {
        // The release function is FnMut; it may carry and mutate its own
        // state across invocations.
        let mut count = 0u32;
        let counted: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&counted);

        let mut cache = ArtifactCache::new(1, move |_key: &str, _path: &Path| {
            count += 1;
            *sink.lock().unwrap() = count;
        })
        .unwrap();

        cache.store("k1".to_string(), PathBuf::from("/tmp/p1"));
        cache.store("k2".to_string(), PathBuf::from("/tmp/p2"));
        cache.store("k3".to_string(), PathBuf::from("/tmp/p3"));

        assert_eq!(*counted.lock().unwrap(), 2);
    }

    #[test]
    fn test_invalidate_recounts_hit_as_miss() {
        let dir = tempdir().unwrap();
        let mut cache = ArtifactCache::with_file_release(4).unwrap();

        let path = write_artifact(dir.path(), "a.jpeg");
        cache.store("a".to_string(), path);
        assert!(cache.lookup("a").is_some());

        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));

        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
    }

    #[test]
    fn test_remove_releases_file_once() {
        let dir = tempdir().unwrap();
        let mut cache = ArtifactCache::with_file_release(4).unwrap();

        let path = write_artifact(dir.path(), "a.jpeg");
        cache.store("a".to_string(), path.clone());

        assert!(cache.remove("a"));
        assert!(!path.exists());
        // Second removal: nothing left to release.
        assert!(!cache.remove("a"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_purge_releases_all_files() {
        let dir = tempdir().unwrap();
        let mut cache = ArtifactCache::with_file_release(8).unwrap();

        let paths: Vec<PathBuf> = (0..5)
            .map(|i| {
                let path = write_artifact(dir.path(), &format!("{}.jpeg", i));
                cache.store(format!("k{}", i), path.clone());
                path
            })
            .collect();

        cache.purge();
        assert!(cache.is_empty());
        for path in paths {
            assert!(!path.exists());
        }
    }

    #[test]
    fn test_release_file_tolerates_missing() {
        let dir = tempdir().unwrap();
        // Must not panic or error on an already-absent path.
        release_file("ghost", &dir.path().join("never-written.jpeg"));
    }

    #[test]
    fn test_stats_track_traffic() {
        let dir = tempdir().unwrap();
        let mut cache = ArtifactCache::with_file_release(1).unwrap();

        cache.lookup("a");
        let path = write_artifact(dir.path(), "a.jpeg");
        cache.store("a".to_string(), path);
        cache.lookup("a");
        let other = write_artifact(dir.path(), "b.jpeg");
        cache.store("b".to_string(), other);

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
    }
}
