//! In-memory LRU image cache bounded by a byte budget.

use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::domain::entities::{ResourceId, SharedImage};

/// Bytes a decoded image occupies: row stride times height.
#[must_use]
pub fn image_byte_size(image: &image::DynamicImage) -> usize {
    image.as_bytes().len()
}

struct CacheEntry {
    image: SharedImage,
    size: usize,
}

struct CacheState {
    entries: LruCache<ResourceId, CacheEntry>,
    bytes_used: usize,
}

/// In-memory LRU cache for decoded images.
/// Thread-safe; the accounted size never exceeds the budget.
pub struct MemoryImageCache {
    state: Mutex<CacheState>,
    budget: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryImageCache {
    /// Creates a cache holding at most `budget` bytes of pixels.
    #[must_use]
    pub fn new(budget: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::unbounded(),
                bytes_used: 0,
            }),
            budget,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up an image and marks it most recently used.
    pub fn get(&self, id: &ResourceId) -> Option<SharedImage> {
        let mut state = self.state.lock();
        if let Some(entry) = state.entries.get(id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(id = %id, "Memory cache hit");
            Some(entry.image.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(id = %id, "Memory cache miss");
            None
        }
    }

    /// Peeks at an image without promoting it in the LRU.
    pub fn peek(&self, id: &ResourceId) -> Option<SharedImage> {
        let state = self.state.lock();
        state.entries.peek(id).map(|entry| entry.image.clone())
    }

    /// Inserts an image unless the id is already cached.
    ///
    /// Evicts least recently used entries until the new one fits. An image larger
    /// than the whole budget is not stored. Returns true if the image was inserted.
    pub fn put(&self, id: ResourceId, image: SharedImage) -> bool {
        let size = image_byte_size(&image);
        if size > self.budget {
            debug!(id = %id, size, budget = self.budget, "Image exceeds memory budget, not cached");
            return false;
        }

        let mut state = self.state.lock();
        if state.entries.contains(&id) {
            return false;
        }

        while state.bytes_used + size > self.budget {
            let Some((evicted, entry)) = state.entries.pop_lru() else {
                break;
            };
            state.bytes_used -= entry.size;
            debug!(id = %evicted, size = entry.size, "Evicted image from memory cache");
        }

        state.bytes_used += size;
        debug!(id = %id, size, "Storing image in memory cache");
        state.entries.put(id, CacheEntry { image, size });
        true
    }

    /// Returns true if the id is cached, without promoting it.
    pub fn contains(&self, id: &ResourceId) -> bool {
        self.state.lock().entries.contains(id)
    }

    /// Returns the number of cached images.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bytes currently accounted.
    pub fn bytes_used(&self) -> usize {
        self.state.lock().bytes_used
    }

    /// Returns the configured byte budget.
    #[must_use]
    pub const fn budget(&self) -> usize {
        self.budget
    }

    /// Drops every cached image.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.bytes_used = 0;
        debug!("Cleared memory image cache");
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        let state = self.state.lock();
        CacheStats {
            hits,
            misses,
            hit_rate,
            size: state.entries.len(),
            bytes_used: state.bytes_used,
        }
    }
}

impl std::fmt::Debug for MemoryImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryImageCache")
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of cached images.
    pub size: usize,
    /// Bytes currently accounted.
    pub bytes_used: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} images ({} bytes), {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.bytes_used, self.hit_rate, self.hits, self.misses
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    // 10x10 RGB8 = 300 bytes.
    fn rgb(width: u32, height: u32) -> SharedImage {
        Arc::new(image::DynamicImage::new_rgb8(width, height))
    }

    #[test]
    fn test_size_is_stride_times_height() {
        assert_eq!(image_byte_size(&rgb(10, 10)), 300);
        assert_eq!(image_byte_size(&image::DynamicImage::new_rgba8(7, 3)), 7 * 4 * 3);
    }

    #[test]
    fn test_cache_put_and_get() {
        let cache = MemoryImageCache::new(10_000);
        let id = ResourceId::new("test1");

        assert!(cache.put(id.clone(), rgb(100, 10)));
        let retrieved = cache.get(&id);

        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().width(), 100);
        assert_eq!(cache.bytes_used(), 3000);
    }

    #[test]
    fn test_put_does_not_overwrite() {
        let cache = MemoryImageCache::new(10_000);
        let id = ResourceId::new("dup");

        assert!(cache.put(id.clone(), rgb(10, 10)));
        assert!(!cache.put(id.clone(), rgb(20, 10)));

        assert_eq!(cache.get(&id).unwrap().width(), 10);
        assert_eq!(cache.bytes_used(), 300);
    }

    #[test]
    fn test_cache_miss() {
        let cache = MemoryImageCache::new(10_000);
        assert!(cache.get(&ResourceId::new("nonexistent")).is_none());
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = MemoryImageCache::new(900);

        let id1 = ResourceId::new("test1");
        let id2 = ResourceId::new("test2");
        let id3 = ResourceId::new("test3");
        let id4 = ResourceId::new("test4");

        cache.put(id1.clone(), rgb(10, 10));
        cache.put(id2.clone(), rgb(10, 10));
        cache.put(id3.clone(), rgb(10, 10));

        // Touch id1 so id2 becomes the oldest.
        let _ = cache.get(&id1);
        cache.put(id4.clone(), rgb(10, 10));

        assert!(cache.contains(&id1));
        assert!(!cache.contains(&id2));
        assert!(cache.contains(&id3));
        assert!(cache.contains(&id4));
        assert_eq!(cache.bytes_used(), 900);
    }

    #[test]
    fn test_large_entry_evicts_several() {
        let cache = MemoryImageCache::new(1000);
        for i in 0..3 {
            cache.put(ResourceId::new(format!("small{i}")), rgb(10, 10));
        }

        // 20x10 RGB8 = 600 bytes; two small entries must go.
        cache.put(ResourceId::new("big"), rgb(20, 10));

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&ResourceId::new("small2")));
        assert!(cache.contains(&ResourceId::new("big")));
        assert!(cache.bytes_used() <= cache.budget());
    }

    #[test]
    fn test_oversized_entry_is_skipped() {
        let cache = MemoryImageCache::new(500);
        cache.put(ResourceId::new("keep"), rgb(10, 10));

        assert!(!cache.put(ResourceId::new("huge"), rgb(100, 100)));
        assert!(cache.contains(&ResourceId::new("keep")));
        assert_eq!(cache.bytes_used(), 300);
    }

    #[test]
    fn test_budget_holds_after_any_sequence() {
        let cache = MemoryImageCache::new(2048);
        for i in 0u32..64 {
            let side = 1 + (i * 7) % 23;
            cache.put(ResourceId::new(format!("img{i}")), rgb(side, side));
            if i % 3 == 0 {
                let _ = cache.get(&ResourceId::new(format!("img{}", i / 2)));
            }
            assert!(cache.bytes_used() <= 2048);
        }
    }

    #[test]
    fn test_cache_stats() {
        let cache = MemoryImageCache::new(10_000);
        let id = ResourceId::new("test1");
        cache.put(id.clone(), rgb(10, 10));

        let _ = cache.get(&id);
        let _ = cache.get(&ResourceId::new("missing"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.bytes_used, 300);
        assert!(stats.to_string().contains("50.0% hit rate"));
    }

    #[test]
    fn test_peek_does_not_promote() {
        let cache = MemoryImageCache::new(600);

        let id1 = ResourceId::new("test1");
        let id2 = ResourceId::new("test2");
        cache.put(id1.clone(), rgb(10, 10));
        cache.put(id2.clone(), rgb(10, 10));

        let _ = cache.peek(&id1);
        cache.put(ResourceId::new("test3"), rgb(10, 10));

        assert!(cache.peek(&id1).is_none());
        assert!(cache.peek(&id2).is_some());
    }

    #[test]
    fn test_clear_resets_accounting() {
        let cache = MemoryImageCache::new(1000);
        cache.put(ResourceId::new("a"), rgb(10, 10));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.bytes_used(), 0);
    }

    #[test]
    fn test_concurrent_puts_respect_budget() {
        let cache = Arc::new(MemoryImageCache::new(3000));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        cache.put(ResourceId::new(format!("t{t}-{i}")), rgb(10, 10));
                        let _ = cache.get(&ResourceId::new(format!("t{t}-{}", i / 2)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.bytes_used() <= 3000);
        assert_eq!(cache.bytes_used(), cache.len() * 300);
    }
}
