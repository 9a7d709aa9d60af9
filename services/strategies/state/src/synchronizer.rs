//! Batched pool state refresh
//!
//! One `ensure_fresh` call issues at most one aggregate request covering
//! every stale pool. Results are decoded positionally: three reads per legacy
//! pool, four per dynamic pool (the extra one is `getPairFees`). A batch is
//! applied to the cache all-or-nothing. Pools already cached at a later
//! block are skipped without a read, since the cache would refuse the write.

use crate::pair_registry::DiscoveredPool;
use crate::pool_cache::PoolStateCache;
use smardex_amm::{Address, FeeMode, PoolSnapshot, U256};
use smardex_dex::abi;
use smardex_dex::{Call, ChainError, ChainReader, DecodingError};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Reads issued for every pool regardless of fee mode
const BASE_READS_PER_POOL: usize = 3;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Block height unknown (block 0), refusing to sync")]
    UnknownBlock,

    #[error("Aggregate returned {actual} results for {expected} calls")]
    BatchMismatch { expected: usize, actual: usize },

    #[error("Failed to decode state of pool {pool:#x}: {source}")]
    Decode {
        pool: Address,
        source: DecodingError,
    },

    #[error("Chain read failed: {0}")]
    Chain(#[from] ChainError),
}

/// Outcome of one `ensure_fresh` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Distinct pools asked for
    pub requested: usize,
    /// Pools read from chain and written to the cache
    pub fetched: usize,
    /// Pools already cached at the requested block
    pub skipped_fresh: usize,
    /// Pools cached at a later block, skipped without a read
    pub superseded: usize,
}

pub struct BatchSynchronizer {
    reader: Arc<dyn ChainReader>,
    cache: Arc<PoolStateCache>,
}

impl BatchSynchronizer {
    pub fn new(reader: Arc<dyn ChainReader>, cache: Arc<PoolStateCache>) -> Self {
        Self { reader, cache }
    }

    pub fn cache(&self) -> &Arc<PoolStateCache> {
        &self.cache
    }

    /// Make sure every pool has a snapshot for `at_block`
    pub async fn ensure_fresh(
        &self,
        pools: &[DiscoveredPool],
        at_block: u64,
    ) -> Result<SyncReport, SyncError> {
        if at_block == 0 {
            error!("Block height not known yet, skipping pool state sync");
            return Err(SyncError::UnknownBlock);
        }

        let mut seen = HashSet::new();
        let unique: Vec<DiscoveredPool> = pools
            .iter()
            .filter(|pool| seen.insert(pool.address))
            .copied()
            .collect();

        let mut report = SyncReport {
            requested: unique.len(),
            ..SyncReport::default()
        };

        let mut stale = Vec::with_capacity(unique.len());
        for pool in &unique {
            if self.cache.is_fresh(&pool.address, at_block) {
                report.skipped_fresh += 1;
            } else if self.cache.is_superseded(&pool.address, at_block) {
                report.superseded += 1;
            } else {
                stale.push(pool);
            }
        }

        if report.superseded > 0 {
            debug!(
                block = at_block,
                pools = report.superseded,
                "Pools already synced at a later block, skipping"
            );
        }

        if stale.is_empty() {
            debug!(
                block = at_block,
                pools = report.requested,
                "No pool needs a read at this block"
            );
            return Ok(report);
        }

        let calls = build_calls(&stale);
        let expected = calls.len();

        let results = self
            .reader
            .aggregate(calls, at_block)
            .await
            .map_err(|e| {
                warn!(block = at_block, pools = stale.len(), error = %e, "Aggregate call failed");
                SyncError::Chain(e)
            })?;

        if results.len() != expected {
            error!(
                block = at_block,
                expected,
                actual = results.len(),
                "Aggregate result count mismatch, discarding batch"
            );
            return Err(SyncError::BatchMismatch {
                expected,
                actual: results.len(),
            });
        }

        // decode the whole batch before touching the cache
        let mut snapshots = Vec::with_capacity(stale.len());
        let mut cursor = 0;
        for pool in &stale {
            let width = reads_for(pool);
            let chunk = &results[cursor..cursor + width];
            cursor += width;

            let snapshot = decode_snapshot(pool, chunk).map_err(|source| {
                error!(
                    pool = %format!("{:#x}", pool.address),
                    block = at_block,
                    error = %source,
                    "Failed to decode pool state, discarding batch"
                );
                SyncError::Decode {
                    pool: pool.address,
                    source,
                }
            })?;
            snapshots.push((pool.address, snapshot));
        }

        for (address, snapshot) in snapshots {
            if self.cache.insert(address, snapshot, at_block) {
                report.fetched += 1;
            }
        }

        info!(
            block = at_block,
            calls = expected,
            fetched = report.fetched,
            skipped = report.skipped_fresh,
            superseded = report.superseded,
            "Pool state batch synced"
        );
        Ok(report)
    }
}

fn reads_for(pool: &DiscoveredPool) -> usize {
    match pool.fee_mode {
        FeeMode::Legacy { .. } => BASE_READS_PER_POOL,
        FeeMode::Dynamic => BASE_READS_PER_POOL + 1,
    }
}

/// Reads in request order: reserves, fictive reserves, price average, then fees for dynamic pools
fn build_calls(pools: &[&DiscoveredPool]) -> Vec<Call> {
    let mut calls = Vec::with_capacity(pools.len() * (BASE_READS_PER_POOL + 1));
    for pool in pools {
        calls.push(Call::new(pool.address, abi::encode_get_reserves()));
        calls.push(Call::new(pool.address, abi::encode_get_fictive_reserves()));
        calls.push(Call::new(pool.address, abi::encode_get_price_average()));
        if !pool.fee_mode.is_legacy() {
            calls.push(Call::new(pool.address, abi::encode_get_pair_fees()));
        }
    }
    calls
}

fn decode_snapshot(pool: &DiscoveredPool, results: &[Vec<u8>]) -> Result<PoolSnapshot, DecodingError> {
    let field = |index: usize, name: &str| {
        results
            .get(index)
            .ok_or_else(|| DecodingError::MissingField(name.to_string()))
    };

    let reserves = abi::decode_reserves(field(0, "getReserves")?)?;
    let fictive = abi::decode_fictive_reserves(field(1, "getFictiveReserves")?)?;
    let average = abi::decode_price_average(field(2, "getPriceAverage")?)?;

    let fetched_fees = match pool.fee_mode {
        FeeMode::Legacy { .. } => None,
        FeeMode::Dynamic => Some(abi::decode_pair_fees(field(3, "getPairFees")?)?),
    };
    let fees = pool
        .fee_mode
        .resolve(fetched_fees)
        .ok_or_else(|| DecodingError::MissingField("getPairFees".to_string()))?;

    Ok(PoolSnapshot {
        reserve0: reserves.reserve0,
        reserve1: reserves.reserve1,
        fictive_reserve0: fictive.reserve0,
        fictive_reserve1: fictive.reserve1,
        price_average0: average.price_average0,
        price_average1: average.price_average1,
        price_average_timestamp: saturating_u64(average.last_timestamp),
        fees,
    })
}

fn saturating_u64(value: U256) -> u64 {
    if value > U256::from(u64::MAX) {
        u64::MAX
    } else {
        value.as_u64()
    }
}
