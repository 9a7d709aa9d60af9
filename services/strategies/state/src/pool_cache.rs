//! Per-block pool snapshot cache
//!
//! This module provides:
//! - Concurrent snapshot storage with DashMap, keyed by pool address
//! - Exact-block validity: a snapshot taken at block N answers only block N
//! - Whole-value replacement so readers never observe a partial update
//!
//! A pool never moves backwards: writes stamped with a block older than the
//! cached one are refused.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use smardex_amm::{Address, PoolSnapshot};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Snapshot plus the block height it was read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSnapshot {
    pub snapshot: PoolSnapshot,
    pub as_of_block: u64,
}

impl CachedSnapshot {
    pub fn is_valid_for(&self, block: u64) -> bool {
        self.as_of_block == block
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolCacheStats {
    pub cached_pools: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub writes: u64,
    pub rejected_writes: u64,
}

#[derive(Debug, Default)]
pub struct PoolStateCache {
    entries: DashMap<Address, CachedSnapshot>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    writes: AtomicU64,
    rejected_writes: AtomicU64,
}

impl PoolStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot for `pool` valid at exactly `block`
    pub fn get(&self, pool: &Address, block: u64) -> Option<PoolSnapshot> {
        match self.entries.get(pool) {
            Some(entry) if entry.is_valid_for(block) => {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.snapshot.clone())
            }
            _ => {
                self.cache_misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Most recent entry regardless of block
    pub fn latest(&self, pool: &Address) -> Option<CachedSnapshot> {
        self.entries.get(pool).map(|entry| entry.clone())
    }

    /// Check if a snapshot for `block` is cached, without touching statistics
    pub fn is_fresh(&self, pool: &Address, block: u64) -> bool {
        self.entries
            .get(pool)
            .map(|entry| entry.is_valid_for(block))
            .unwrap_or(false)
    }

    /// True when the cached snapshot is from a block later than `block`,
    /// so a read at `block` could never be stored
    pub fn is_superseded(&self, pool: &Address, block: u64) -> bool {
        self.entries
            .get(pool)
            .map(|entry| entry.as_of_block > block)
            .unwrap_or(false)
    }

    /// Store `snapshot` as read at `block`.
    ///
    /// Returns `false` when a snapshot from a later block is already cached;
    /// the cache is left untouched in that case.
    pub fn insert(&self, pool: Address, snapshot: PoolSnapshot, block: u64) -> bool {
        let fresh = CachedSnapshot {
            snapshot,
            as_of_block: block,
        };

        match self.entries.entry(pool) {
            Entry::Occupied(mut occupied) => {
                let cached_block = occupied.get().as_of_block;
                if block < cached_block {
                    self.rejected_writes.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        pool = %format!("{:#x}", pool),
                        block,
                        cached_block,
                        "Refusing to replace newer pool snapshot"
                    );
                    return false;
                }
                occupied.insert(fresh);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
            }
        }

        self.writes.fetch_add(1, Ordering::Relaxed);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> PoolCacheStats {
        PoolCacheStats {
            cached_pools: self.entries.len(),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            rejected_writes: self.rejected_writes.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smardex_amm::{PoolFees, U256};

    fn snapshot(reserve: u64) -> PoolSnapshot {
        let value = U256::from(reserve);
        PoolSnapshot {
            reserve0: value,
            reserve1: value,
            fictive_reserve0: value,
            fictive_reserve1: value,
            price_average0: value,
            price_average1: value,
            price_average_timestamp: 1,
            fees: PoolFees::ZERO,
        }
    }

    #[test]
    fn test_snapshot_only_valid_for_its_block() {
        let cache = PoolStateCache::new();
        let pool = Address::repeat_byte(0xaa);
        cache.insert(pool, snapshot(100), 10);

        assert_eq!(cache.get(&pool, 10), Some(snapshot(100)));
        assert_eq!(cache.get(&pool, 11), None);
        assert_eq!(cache.get(&pool, 9), None);
        assert!(cache.is_fresh(&pool, 10));
        assert!(!cache.is_fresh(&pool, 11));

        let stats = cache.stats();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 2);
    }

    #[test]
    fn test_newer_block_replaces_whole_snapshot() {
        let cache = PoolStateCache::new();
        let pool = Address::repeat_byte(0xaa);
        cache.insert(pool, snapshot(100), 10);
        assert!(cache.insert(pool, snapshot(200), 12));

        let latest = cache.latest(&pool).unwrap();
        assert_eq!(latest.as_of_block, 12);
        assert_eq!(latest.snapshot, snapshot(200));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_older_block_is_rejected() {
        let cache = PoolStateCache::new();
        let pool = Address::repeat_byte(0xaa);
        cache.insert(pool, snapshot(200), 12);

        assert!(!cache.insert(pool, snapshot(100), 10));
        assert_eq!(cache.get(&pool, 12), Some(snapshot(200)));
        assert_eq!(cache.stats().rejected_writes, 1);
    }

    #[test]
    fn test_superseded_only_below_cached_block() {
        let cache = PoolStateCache::new();
        let pool = Address::repeat_byte(0xaa);
        assert!(!cache.is_superseded(&pool, 10));

        cache.insert(pool, snapshot(200), 12);
        assert!(cache.is_superseded(&pool, 11));
        assert!(!cache.is_superseded(&pool, 12));
        assert!(!cache.is_superseded(&pool, 13));
    }

    #[test]
    fn test_same_block_rewrite_is_accepted() {
        let cache = PoolStateCache::new();
        let pool = Address::repeat_byte(0xaa);
        cache.insert(pool, snapshot(100), 10);

        assert!(cache.insert(pool, snapshot(150), 10));
        assert_eq!(cache.get(&pool, 10), Some(snapshot(150)));
    }
}
