//! Fee policy for SmarDex pools
//!
//! Pools deployed under the first contract version carry fixed fees that
//! cannot be queried; later pools expose `getPairFees()`. The policy is
//! decided once per pool from a static address list.

use ethers_core::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Denominator for `fees_lp` and `fees_pool` (parts per million)
pub const FEES_BASE: u128 = 1_000_000;

/// Fixed fees applied to every legacy layer-one pool: 0.05% LP, 0.02% pool
pub const FEES_LEGACY_LAYER_ONE: PoolFees = PoolFees {
    fees_lp: 500,
    fees_pool: 200,
};

/// Liquidity-provider and protocol fee, both in parts per [`FEES_BASE`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolFees {
    pub fees_lp: u128,
    pub fees_pool: u128,
}

impl PoolFees {
    pub const ZERO: PoolFees = PoolFees {
        fees_lp: 0,
        fees_pool: 0,
    };

    pub fn new(fees_lp: u128, fees_pool: u128) -> Self {
        Self { fees_lp, fees_pool }
    }

    /// Total fee taken from the input amount
    pub fn total(&self) -> u128 {
        self.fees_lp.saturating_add(self.fees_pool)
    }

    /// True when the pair leaves a non-zero share of the input after fees
    pub fn is_valid(&self) -> bool {
        self.total() < FEES_BASE
    }
}

/// How a pool's fees are obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeMode {
    /// Fixed pair known from configuration; no on-chain fee read
    Legacy { fees: PoolFees },
    /// Fees read from the pool with every state refresh
    Dynamic,
}

impl FeeMode {
    pub fn is_legacy(&self) -> bool {
        matches!(self, FeeMode::Legacy { .. })
    }

    /// Pick the fees a quote must use.
    ///
    /// Legacy pools ignore `fetched` entirely; dynamic pools have nothing to
    /// fall back on when the fee read is missing.
    pub fn resolve(&self, fetched: Option<PoolFees>) -> Option<PoolFees> {
        match self {
            FeeMode::Legacy { fees } => Some(*fees),
            FeeMode::Dynamic => fetched,
        }
    }
}

/// Static membership check against the configured legacy pool list
#[derive(Debug, Clone)]
pub struct FeePolicy {
    legacy_pools: HashSet<Address>,
    legacy_fees: PoolFees,
}

impl FeePolicy {
    pub fn new<I>(legacy_pools: I, legacy_fees: PoolFees) -> Self
    where
        I: IntoIterator<Item = Address>,
    {
        Self {
            legacy_pools: legacy_pools.into_iter().collect(),
            legacy_fees,
        }
    }

    pub fn mode_for(&self, pool: &Address) -> FeeMode {
        if self.legacy_pools.contains(pool) {
            FeeMode::Legacy {
                fees: self.legacy_fees,
            }
        } else {
            FeeMode::Dynamic
        }
    }

    pub fn legacy_fees(&self) -> PoolFees {
        self.legacy_fees
    }

    pub fn legacy_pool_count(&self) -> usize {
        self.legacy_pools.len()
    }
}
