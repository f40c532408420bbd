//! Interning caches for interval sequences
//!
//! Many interval sets (one per tracked series) frequently hold identical
//! sequences. After each mutation a set hands its new sequence to the cache
//! and adopts whatever canonical instance comes back, so equal sequences
//! share one allocation. A miss is always a valid answer: the candidate is
//! returned unchanged.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use crate::config::IntervalConfig;

/// Thread-safe store of canonical interval sequences
pub trait InternCache<I>: Send + Sync {
    /// Return the canonical sequence equal to `candidate`, registering
    /// `candidate` as canonical when none is known.
    fn intern(&self, candidate: Arc<[I]>) -> Arc<[I]>;

    /// Number of sequences currently held
    fn len(&self) -> usize;

    /// Whether the cache holds no sequences
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit, miss and eviction counters
    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

/// Counters reported by an [`InternCache`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered with an existing sequence
    pub hits: u64,
    /// Lookups that registered the candidate
    pub misses: u64,
    /// Sequences dropped to respect the capacity
    pub evictions: u64,
    /// Sequences currently held
    pub entries: usize,
}

/// A cache that never shares anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl<I: Send + Sync> InternCache<I> for NoopCache {
    fn intern(&self, candidate: Arc<[I]>) -> Arc<[I]> {
        candidate
    }

    fn len(&self) -> usize {
        0
    }
}

type Shard<I> = Mutex<LruCache<Arc<[I]>, (), ahash::RandomState>>;

/// Sharded, bounded least-recently-used interning cache.
///
/// Sequences are keyed on their full ordered contents. Each shard has its
/// own lock, so sets interning unrelated sequences rarely contend. The
/// shard capacities sum to exactly the configured capacity.
pub struct LruInternCache<I> {
    shards: Box<[Shard<I>]>,
    hasher: ahash::RandomState,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<I: Eq + std::hash::Hash + Send + Sync> LruInternCache<I> {
    /// Create a cache holding at most `capacity` sequences spread over
    /// `shards` partitions. A capacity of zero disables interning.
    pub fn new(capacity: usize, shards: usize) -> Self {
        let shard_count = shards.clamp(1, capacity.max(1));
        let per_shard = capacity / shard_count;
        let remainder = capacity % shard_count;
        let hasher = ahash::RandomState::new();

        // Every shard gets at least one slot since shard_count <= capacity.
        let shards = (0..shard_count)
            .filter_map(|i| NonZeroUsize::new(per_shard + usize::from(i < remainder)))
            .map(|cap| Mutex::new(LruCache::with_hasher(cap, hasher.clone())))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            shards,
            hasher,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Create a cache sized by `config`
    pub fn with_config(config: &IntervalConfig) -> Self {
        Self::new(config.cache_capacity, config.cache_shards)
    }

    /// Number of shards; zero when interning is disabled
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Total number of sequences the shards can hold
    pub fn capacity(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().cap().get()).sum()
    }

    fn shard_for(&self, sequence: &[I]) -> Option<&Shard<I>> {
        if self.shards.is_empty() {
            return None;
        }
        let hash = self.hasher.hash_one(sequence);
        Some(&self.shards[(hash % self.shards.len() as u64) as usize])
    }
}

impl<I: Eq + std::hash::Hash + Send + Sync> InternCache<I> for LruInternCache<I> {
    fn intern(&self, candidate: Arc<[I]>) -> Arc<[I]> {
        let Some(shard) = self.shard_for(&candidate) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return candidate;
        };
        let mut shard = shard.lock();
        if let Some((canonical, _)) = shard.get_key_value(&*candidate) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(canonical);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        if shard.push(Arc::clone(&candidate), ()).is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            trace!("evicted interned interval sequence");
        }
        candidate
    }

    fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl<I> std::fmt::Debug for LruInternCache<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruInternCache")
            .field("shards", &self.shards.len())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}
