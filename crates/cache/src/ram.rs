//! RAM surface cache with LRU eviction
//!
//! Provides in-memory caching of rendered page surfaces with automatic
//! eviction based on Least Recently Used (LRU) policy when the memory budget
//! is reached. Changing zoom or viewport geometry produces new keys; the
//! budget keeps the dead weight from older geometries bounded.

use crate::config::CacheConfig;
use crate::key::SurfaceKey;
use crate::surface::Surface;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

/// Statistics about cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of surfaces currently in cache
    pub entry_count: usize,

    /// Total memory used by cached surfaces (bytes)
    pub memory_used: usize,

    /// Maximum memory allowed (bytes)
    pub memory_limit: usize,

    /// Number of cache hits
    pub hits: u64,

    /// Number of cache misses
    pub misses: u64,

    /// Number of surfaces evicted due to memory pressure
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Calculate memory utilization (0.0 to 1.0)
    pub fn memory_utilization(&self) -> f64 {
        if self.memory_limit == 0 {
            0.0
        } else {
            self.memory_used as f64 / self.memory_limit as f64
        }
    }
}

/// Internal cache state
struct CacheState {
    /// Map from key to rendered surface
    entries: HashMap<SurfaceKey, Arc<Surface>>,

    /// LRU queue (most recently used at back, least recently used at front)
    lru_queue: VecDeque<SurfaceKey>,

    /// Current memory usage in bytes
    memory_used: usize,

    /// Maximum memory allowed in bytes
    memory_limit: usize,

    /// Statistics
    stats: CacheStats,
}

impl CacheState {
    fn new(memory_limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru_queue: VecDeque::new(),
            memory_used: 0,
            memory_limit,
            stats: CacheStats { memory_limit, ..Default::default() },
        }
    }

    /// Move a key to the back of the LRU queue (mark as most recently used)
    fn touch(&mut self, key: SurfaceKey) {
        self.lru_queue.retain(|k| *k != key);
        self.lru_queue.push_back(key);
    }

    fn lookup(&mut self, key: SurfaceKey) -> Option<Arc<Surface>> {
        match self.entries.get(&key).cloned() {
            Some(surface) => {
                self.touch(key);
                self.stats.hits += 1;
                Some(surface)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    fn remove(&mut self, key: SurfaceKey) -> Option<Arc<Surface>> {
        let surface = self.entries.remove(&key)?;
        self.memory_used = self.memory_used.saturating_sub(surface.memory_size());
        self.lru_queue.retain(|k| *k != key);
        self.sync_stats();
        Some(surface)
    }

    /// Evict the least recently used surface
    fn evict_lru(&mut self) -> Option<Arc<Surface>> {
        let key = self.lru_queue.pop_front()?;
        let surface = self.entries.remove(&key)?;
        self.memory_used = self.memory_used.saturating_sub(surface.memory_size());
        self.stats.evictions += 1;
        self.sync_stats();
        tracing::trace!(%key, "evicted surface");
        Some(surface)
    }

    /// Evict surfaces until `required_size` more bytes fit under the limit
    fn evict_to_fit(&mut self, required_size: usize) {
        while self.memory_used + required_size > self.memory_limit && !self.entries.is_empty() {
            if self.evict_lru().is_none() {
                break;
            }
        }
    }

    fn insert(&mut self, key: SurfaceKey, surface: Arc<Surface>) {
        let size = surface.memory_size();

        // Last write wins for a key that was rendered twice
        self.remove(key);

        if size > self.memory_limit {
            tracing::debug!(%key, size, limit = self.memory_limit, "surface exceeds cache budget");
            return;
        }

        self.evict_to_fit(size);
        self.memory_used += size;
        self.entries.insert(key, surface);
        self.touch(key);
        self.sync_stats();
    }

    fn sync_stats(&mut self) {
        self.stats.entry_count = self.entries.len();
        self.stats.memory_used = self.memory_used;
    }
}

/// RAM surface cache with LRU eviction
///
/// Thread-safe in-memory cache for rendered page surfaces. Surfaces are
/// shared as `Arc<Surface>`, so a hit hands back the exact surface that was
/// stored. When the cache reaches its memory limit, the least recently used
/// surfaces are evicted automatically.
///
/// # Example
///
/// ```
/// use flipbook_cache::{Surface, SurfaceCache, SurfaceKey};
///
/// let cache = SurfaceCache::new(16 * 1024 * 1024);
/// let key = SurfaceKey::new(1, 300.0, 400.0, 1.0, 2.0);
///
/// let first = cache.get_or_render(key, || Surface::blank(600, 800));
/// let second = cache.get_or_render(key, || unreachable!("served from cache"));
///
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// assert_eq!(cache.stats().hits, 1);
/// ```
#[derive(Clone)]
pub struct SurfaceCache {
    state: Arc<Mutex<CacheState>>,
}

impl SurfaceCache {
    /// Create a new surface cache with the specified memory limit in bytes
    pub fn new(memory_limit: usize) -> Self {
        Self { state: Arc::new(Mutex::new(CacheState::new(memory_limit))) }
    }

    /// Create a new surface cache with a memory limit in megabytes
    pub fn with_mb_limit(megabytes: usize) -> Self {
        Self::new(megabytes * 1024 * 1024)
    }

    /// Create a cache sized from a [`CacheConfig`]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.memory_limit)
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // Every mutation completes before unlocking, so a poisoned state is
        // still consistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the cached surface for `key`, rendering it on a miss
    ///
    /// The lock is not held while `render` runs. Two concurrent misses for
    /// the same key may both render; the later insert replaces the earlier
    /// one.
    pub fn get_or_render<F>(&self, key: SurfaceKey, render: F) -> Arc<Surface>
    where
        F: FnOnce() -> Surface,
    {
        if let Some(surface) = self.lock().lookup(key) {
            return surface;
        }

        let surface = Arc::new(render());
        self.lock().insert(key, Arc::clone(&surface));
        surface
    }

    /// Check if a surface is cached without updating LRU tracking
    pub fn contains(&self, key: SurfaceKey) -> bool {
        self.lock().entries.contains_key(&key)
    }

    /// Clear all surfaces from the cache
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.lru_queue.clear();
        state.memory_used = 0;
        state.sync_stats();
    }

    /// Get current cache statistics
    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    /// Update the memory limit, evicting if usage is now over it
    pub fn set_memory_limit(&self, new_limit: usize) {
        let mut state = self.lock();
        state.memory_limit = new_limit;
        state.stats.memory_limit = new_limit;

        if state.memory_used > new_limit {
            state.evict_to_fit(0);
        }
    }

    /// Number of surfaces currently cached
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}

impl Default for SurfaceCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

impl std::fmt::Debug for SurfaceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceCache").field("stats", &self.stats()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    // 64x64 RGBA = 16KB
    const TILE_BYTES: usize = 64 * 64 * 4;

    fn key(page: u32) -> SurfaceKey {
        SurfaceKey::new(page, 64.0, 64.0, 1.0, 1.0)
    }

    fn tile() -> Surface {
        Surface::blank(64, 64)
    }

    #[test]
    fn test_miss_renders_and_stores() {
        let cache = SurfaceCache::new(1024 * 1024);
        let renders = Cell::new(0);

        let surface = cache.get_or_render(key(1), || {
            renders.set(renders.get() + 1);
            tile()
        });

        assert_eq!(renders.get(), 1);
        assert_eq!(surface.width(), 64);
        assert!(cache.contains(key(1)));
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_hit_returns_identical_surface_without_rendering() {
        let cache = SurfaceCache::new(1024 * 1024);
        let renders = Cell::new(0);
        let render = || {
            renders.set(renders.get() + 1);
            tile()
        };

        let first = cache.get_or_render(key(1), render);
        let second = cache.get_or_render(key(1), || {
            renders.set(renders.get() + 1);
            tile()
        });

        assert_eq!(renders.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.pixels().as_raw(), second.pixels().as_raw());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_different_geometry_is_a_different_entry() {
        let cache = SurfaceCache::new(1024 * 1024);

        cache.get_or_render(SurfaceKey::new(1, 64.0, 64.0, 1.0, 1.0), tile);
        cache.get_or_render(SurfaceKey::new(1, 64.0, 64.0, 1.5, 1.0), tile);
        cache.get_or_render(SurfaceKey::new(1, 80.0, 64.0, 1.0, 1.0), tile);

        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = SurfaceCache::new(2 * TILE_BYTES);

        cache.get_or_render(key(1), tile);
        cache.get_or_render(key(2), tile);
        cache.get_or_render(key(3), tile); // Should evict page 1

        assert!(!cache.contains(key(1)));
        assert!(cache.contains(key(2)));
        assert!(cache.contains(key(3)));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_lru_ordering() {
        let cache = SurfaceCache::new(2 * TILE_BYTES);

        cache.get_or_render(key(1), tile);
        cache.get_or_render(key(2), tile);

        // A hit on page 1 makes it more recently used
        cache.get_or_render(key(1), tile);
        assert_eq!(cache.stats().hits, 1);

        cache.get_or_render(key(3), tile);

        assert!(cache.contains(key(1)));
        assert!(!cache.contains(key(2)));
        assert!(cache.contains(key(3)));
    }

    #[test]
    fn test_oversized_surface_is_returned_but_not_retained() {
        let cache = SurfaceCache::new(TILE_BYTES / 2);

        let surface = cache.get_or_render(key(1), tile);

        assert_eq!(surface.memory_size(), TILE_BYTES);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().memory_used, 0);
    }

    #[test]
    fn test_clear() {
        let cache = SurfaceCache::new(1024 * 1024);
        cache.get_or_render(key(1), tile);
        cache.get_or_render(key(2), tile);
        assert_eq!(cache.stats().memory_used, 2 * TILE_BYTES);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().memory_used, 0);
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[test]
    fn test_shrinking_limit_evicts() {
        let cache = SurfaceCache::new(4 * TILE_BYTES);
        for page in 1..=4 {
            cache.get_or_render(key(page), tile);
        }

        cache.set_memory_limit(TILE_BYTES);

        assert_eq!(cache.len(), 1);
        assert!(cache.contains(key(4)));
        assert_eq!(cache.stats().memory_limit, TILE_BYTES);
    }

    #[test]
    fn test_stats_rates() {
        let cache = SurfaceCache::new(4 * TILE_BYTES);
        cache.get_or_render(key(1), tile);
        cache.get_or_render(key(1), tile);

        let stats = cache.stats();
        assert_eq!(stats.hit_rate(), 0.5);
        assert_eq!(stats.memory_utilization(), 0.25);
    }

    #[test]
    fn test_clones_share_state() {
        let cache = SurfaceCache::new(1024 * 1024);
        let handle = cache.clone();

        handle.get_or_render(key(9), tile);
        assert!(cache.contains(key(9)));
    }
}
