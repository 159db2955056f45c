use crate::types::Value;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const CACHE_ENTRY_OVERHEAD_BYTES: usize = 64;
const ROW_BASE_OVERHEAD_BYTES: usize = 16;

/// Estimated in-memory size of a cacheable value.
///
/// Estimates only need to correlate monotonically with actual size; the cache
/// budget is approximate by design.
pub trait CacheWeight {
    fn weight_bytes(&self) -> usize;
}

impl CacheWeight for Value {
    fn weight_bytes(&self) -> usize {
        match self {
            Self::Null => 0,
            Self::Integer(_) | Self::Real(_) => 8,
            Self::Text(s) => s.len(),
            Self::Blob(b) => b.len(),
        }
    }
}

impl CacheWeight for String {
    fn weight_bytes(&self) -> usize {
        self.len()
    }
}

impl<T: CacheWeight> CacheWeight for Vec<T> {
    fn weight_bytes(&self) -> usize {
        self.iter().fold(ROW_BASE_OVERHEAD_BYTES, |bytes, item| {
            bytes.saturating_add(item.weight_bytes())
        })
    }
}

impl<T: CacheWeight> CacheWeight for Arc<T> {
    fn weight_bytes(&self) -> usize {
        self.as_ref().weight_bytes()
    }
}

/// Current cache occupancy. Diagnostic only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub items: usize,
    pub used_bytes: usize,
    pub budget_bytes: usize,
    pub utilization_percent: f64,
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    bytes: usize,
    hits: u64,
    seq: u64,
}

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    bytes: usize,
    next_seq: u64,
}

/// Byte-budgeted key/value cache with least-frequently-used eviction.
///
/// This is deliberately LFU, not LRU: eviction removes the entry with the
/// smallest cumulative hit count, so a cold entry with many accumulated hits
/// survives even when it has not been touched recently. Ties go to the oldest
/// insertion. Keys are caller-constructed and must embed enough identity
/// (e.g. relation plus page index) to avoid collisions across relations.
///
/// All operations are internally synchronized; clones share the same store,
/// which is how the paginator hands its cache to the background prefetch
/// thread.
#[derive(Debug, Clone)]
pub struct BoundedCache<V> {
    budget_bytes: usize,
    inner: Arc<Mutex<Inner<V>>>,
}

impl<V> BoundedCache<V> {
    pub fn new(budget_bytes: usize) -> Self {
        Self {
            budget_bytes,
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                bytes: 0,
                next_seq: 0,
            })),
        }
    }

    pub fn budget_bytes(&self) -> usize {
        self.budget_bytes
    }

    /// Whether `key` is resident. Unlike [`BoundedCache::get`], this does not
    /// bump the hit counter.
    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .lock()
            .expect("cache mutex poisoned")
            .entries
            .contains_key(key)
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.entries.clear();
        inner.bytes = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("cache mutex poisoned");
        let utilization_percent = if self.budget_bytes == 0 {
            0.0
        } else {
            inner.bytes as f64 / self.budget_bytes as f64 * 100.0
        };
        CacheStats {
            items: inner.entries.len(),
            used_bytes: inner.bytes,
            budget_bytes: self.budget_bytes,
            utilization_percent,
        }
    }
}

impl<V: Clone> BoundedCache<V> {
    /// Return the cached value for `key`, bumping its hit counter.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let entry = inner.entries.get_mut(key)?;
        entry.hits = entry.hits.saturating_add(1);
        Some(entry.value.clone())
    }
}

impl<V: CacheWeight> BoundedCache<V> {
    /// Insert or overwrite `key`, evicting least-frequently-used entries until
    /// the new total fits the budget. Overwriting resets the hit counter.
    ///
    /// An entry larger than the whole budget is still admitted once the cache
    /// has been emptied, so the reported size may exceed the budget by at most
    /// the size of the most recent insertion.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let bytes = CACHE_ENTRY_OVERHEAD_BYTES
            .saturating_add(key.len())
            .saturating_add(value.weight_bytes());

        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        if let Some(old) = inner.entries.remove(&key) {
            inner.bytes = inner.bytes.saturating_sub(old.bytes);
        }

        while inner.bytes.saturating_add(bytes) > self.budget_bytes && !inner.entries.is_empty() {
            // O(n) scan for the minimum; fine at the entry counts this cache
            // sees, and it keeps the counter map a plain map.
            let victim = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| (entry.hits, entry.seq))
                .map(|(victim_key, _)| victim_key.clone());
            let Some(victim) = victim else { break };
            if let Some(evicted) = inner.entries.remove(&victim) {
                inner.bytes = inner.bytes.saturating_sub(evicted.bytes);
                tracing::debug!(key = %victim, hits = evicted.hits, "evicting least-frequently-used cache entry");
            }
        }

        let seq = inner.next_seq;
        inner.next_seq = inner.next_seq.saturating_add(1);
        inner.bytes = inner.bytes.saturating_add(bytes);
        inner.entries.insert(
            key,
            Entry {
                value,
                bytes,
                hits: 0,
                seq,
            },
        );
    }
}

impl<V> Default for BoundedCache<V> {
    /// A 16 MiB cache, matching [`crate::PaginatorConfig::default`].
    fn default() -> Self {
        Self::new(16 * 1024 * 1024)
    }
}
