//! LRU cache for extracted slices.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use lru::LruCache;
use tracing::debug;

use crate::error::Result;
use crate::field::GriddedField;
use crate::primitive::CuttingPrimitive;
use crate::slice::Slice;
use crate::types::{CacheStats, Checked, Condition, SamplingMode, SmoothingKind};

/// Cache key: everything a slice is a function of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SliceKey {
    pub field: u64,
    pub primitive: u64,
    pub mode: SamplingMode,
    pub smoothing: SmoothingKind,
    pub factor: u32,
}

impl SliceKey {
    pub fn new(
        field: &GriddedField,
        primitive: &CuttingPrimitive,
        mode: SamplingMode,
        smoothing: SmoothingKind,
        factor: u32,
    ) -> Self {
        let mut hasher = DefaultHasher::new();
        primitive.hash(&mut hasher);
        Self {
            field: field.fingerprint(),
            primitive: hasher.finish(),
            mode,
            smoothing,
            factor,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    slice: Arc<Slice>,
    conditions: Vec<Condition>,
}

impl Entry {
    fn size(&self) -> usize {
        self.slice.values.len() * std::mem::size_of::<f32>() + std::mem::size_of::<Slice>()
    }
}

struct Inner {
    cache: LruCache<SliceKey, Entry>,
    current_memory: usize,
}

/// Memory-bounded LRU cache of slices, safe to share between threads.
///
/// A single mutex guards the map. Computation in
/// [`SliceCache::get_or_compute`] happens outside the lock, so two callers
/// missing on the same key may both compute; the later insert wins.
pub struct SliceCache {
    inner: Mutex<Inner>,
    memory_limit: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl SliceCache {
    /// Create a new slice cache with the given memory limit in bytes.
    pub fn new(memory_limit: usize) -> Self {
        // Estimate max entries assuming ~256KB per slice
        let slice_size_estimate = 256 * 1024;
        let max_entries = (memory_limit / slice_size_estimate).max(16);

        Self {
            inner: Mutex::new(Inner {
                cache: LruCache::new(NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN)),
                current_memory: 0,
            }),
            memory_limit,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up a slice, with the conditions raised when it was computed.
    pub fn get(&self, key: &SliceKey) -> Option<Checked<Arc<Slice>>> {
        let mut inner = self.lock();
        match inner.cache.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Checked {
                    value: entry.slice.clone(),
                    conditions: entry.conditions.clone(),
                })
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Check if a key exists without updating LRU order.
    pub fn contains(&self, key: &SliceKey) -> bool {
        self.lock().cache.contains(key)
    }

    /// Insert a slice, evicting least recently used entries to make room.
    pub fn insert(&self, key: SliceKey, slice: Checked<Arc<Slice>>) {
        let entry = Entry {
            slice: slice.value,
            conditions: slice.conditions,
        };
        let size = entry.size();

        let mut inner = self.lock();
        if let Some(old) = inner.cache.pop(&key) {
            inner.current_memory = inner.current_memory.saturating_sub(old.size());
        }

        while inner.current_memory + size > self.memory_limit && !inner.cache.is_empty() {
            if let Some((_, evicted)) = inner.cache.pop_lru() {
                inner.current_memory = inner.current_memory.saturating_sub(evicted.size());
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        if size <= self.memory_limit {
            if let Some((_, evicted)) = inner.cache.push(key, entry) {
                // Entry-count bound reached
                inner.current_memory = inner.current_memory.saturating_sub(evicted.size());
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
            inner.current_memory += size;
        } else {
            debug!(bytes = size, limit = self.memory_limit, "Slice larger than cache, not cached");
        }
    }

    /// Return the cached slice for `key`, computing and caching it on a miss.
    ///
    /// `compute` returning `Ok(None)` (nothing worth caching) is passed
    /// through without touching the cache.
    pub fn get_or_compute<F>(&self, key: SliceKey, compute: F) -> Result<Option<Checked<Arc<Slice>>>>
    where
        F: FnOnce() -> Result<Option<Checked<Slice>>>,
    {
        if let Some(hit) = self.get(&key) {
            debug!(field = key.field, "Slice cache hit");
            return Ok(Some(hit));
        }

        let Some(computed) = compute()? else {
            return Ok(None);
        };
        let computed = computed.map(Arc::new);
        self.insert(key, computed.clone());
        Ok(Some(computed))
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: inner.cache.len(),
            memory_bytes: inner.current_memory as u64,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Clear all entries from the cache.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.cache.clear();
        inner.current_memory = 0;
    }

    /// Get the current memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        self.lock().current_memory
    }

    /// Get the memory limit in bytes.
    pub fn memory_limit(&self) -> usize {
        self.memory_limit
    }

    pub fn len(&self) -> usize {
        self.lock().cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::SliceGeometry;

    fn slice(n: usize, value: f32) -> Slice {
        Slice {
            fingerprint: 0,
            field_id: "f".into(),
            unit: "K".into(),
            mode: SamplingMode::NearestNeighbor,
            geometry: SliceGeometry::Scattered { positions: vec![] },
            times: vec![],
            columns: n,
            rows: 1,
            values: vec![value; n],
        }
    }

    fn key(primitive: u64) -> SliceKey {
        SliceKey {
            field: 1,
            primitive,
            mode: SamplingMode::NearestNeighbor,
            smoothing: SmoothingKind::None,
            factor: 0,
        }
    }

    #[test]
    fn test_cache_insert_and_get() {
        let cache = SliceCache::new(1024 * 1024);
        assert!(cache.get(&key(1)).is_none());

        cache.insert(key(1), Checked::new(Arc::new(slice(4, 2.0))));
        let hit = cache.get(&key(1)).unwrap();
        assert_eq!(hit.value.values, vec![2.0; 4]);
    }

    #[test]
    fn test_cache_keeps_conditions() {
        let cache = SliceCache::new(1024 * 1024);
        let checked = Checked::new(Arc::new(slice(2, 1.0)))
            .with_condition(Condition::unit_conversion("hPa", "m"));
        cache.insert(key(3), checked);
        assert_eq!(cache.get(&key(3)).unwrap().conditions.len(), 1);
    }

    #[test]
    fn test_cache_lru_eviction() {
        let entry_size = 16 * 4 + std::mem::size_of::<Slice>();
        let cache = SliceCache::new(entry_size * 3);

        for i in 0..10 {
            cache.insert(key(i), Checked::new(Arc::new(slice(16, i as f32))));
        }

        assert!(cache.get(&key(0)).is_none());
        assert!(cache.get(&key(9)).is_some());
        assert!(cache.stats().evictions > 0);
        assert!(cache.memory_usage() <= cache.memory_limit());
    }

    #[test]
    fn test_get_or_compute_computes_once() {
        let cache = SliceCache::new(1024 * 1024);
        let mut calls = 0;

        for _ in 0..3 {
            let got = cache
                .get_or_compute(key(5), || {
                    calls += 1;
                    Ok(Some(Checked::new(slice(4, 7.0))))
                })
                .unwrap()
                .unwrap();
            assert_eq!(got.value.values[0], 7.0);
        }

        assert_eq!(calls, 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_get_or_compute_skips_none() {
        let cache = SliceCache::new(1024 * 1024);
        let got = cache.get_or_compute(key(6), || Ok(None)).unwrap();
        assert!(got.is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_distinguishes_parameters() {
        let a = key(1);
        let b = SliceKey {
            smoothing: SmoothingKind::Gaussian,
            factor: 2,
            ..a
        };
        assert_ne!(a, b);
    }

    #[test]
    fn test_cache_clear() {
        let cache = SliceCache::new(1024 * 1024);
        cache.insert(key(1), Checked::new(Arc::new(slice(4, 1.0))));
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.memory_usage(), 0);
    }
}
