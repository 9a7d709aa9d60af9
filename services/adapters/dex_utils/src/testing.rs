//! Testing utilities for chain access
//!
//! `MockChainReader` answers factory lookups and aggregate calls from
//! in-memory pool state and counts every request it receives.

use crate::abi::{self, Call};
use crate::chain::{ChainError, ChainReader};
use async_trait::async_trait;
use dashmap::DashMap;
use ethabi::{Address, Token, Uint};
use smardex_amm::PoolFees;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// On-chain view of one mocked pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPool {
    pub reserves: (Uint, Uint),
    pub fictive_reserves: (Uint, Uint),
    pub price_average: (Uint, Uint),
    pub price_average_timestamp: u64,
    pub fees: PoolFees,
}

impl MockPool {
    /// Pool whose real, fictive and average reserves all equal `reserve`
    pub fn balanced(reserve: u64, fees: PoolFees, timestamp: u64) -> Self {
        let value = Uint::from(reserve);
        Self {
            reserves: (value, value),
            fictive_reserves: (value, value),
            price_average: (value, value),
            price_average_timestamp: timestamp,
            fees,
        }
    }
}

/// In-memory `ChainReader`
#[derive(Debug, Default)]
pub struct MockChainReader {
    pairs: DashMap<(Address, Address), Address>,
    pools: DashMap<Address, MockPool>,
    get_pair_calls: AtomicUsize,
    aggregate_calls: AtomicUsize,
    last_batch_size: AtomicUsize,
    dropped_results: AtomicUsize,
    fail_get_pair: AtomicBool,
    fail_aggregate: AtomicBool,
}

impl MockChainReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `pool` as the factory's pair for the two tokens
    pub fn add_pool(&self, token_a: Address, token_b: Address, pool: Address, state: MockPool) {
        self.pairs.insert(ordered(token_a, token_b), pool);
        self.pools.insert(pool, state);
    }

    pub fn set_pool_state(&self, pool: Address, state: MockPool) {
        self.pools.insert(pool, state);
    }

    pub fn get_pair_calls(&self) -> usize {
        self.get_pair_calls.load(Ordering::SeqCst)
    }

    pub fn aggregate_calls(&self) -> usize {
        self.aggregate_calls.load(Ordering::SeqCst)
    }

    /// Number of sub-calls in the most recent aggregate request
    pub fn last_batch_size(&self) -> usize {
        self.last_batch_size.load(Ordering::SeqCst)
    }

    /// Drop the last `count` results from every aggregate response
    pub fn drop_results(&self, count: usize) {
        self.dropped_results.store(count, Ordering::SeqCst);
    }

    pub fn fail_get_pair(&self, fail: bool) {
        self.fail_get_pair.store(fail, Ordering::SeqCst);
    }

    pub fn fail_aggregate(&self, fail: bool) {
        self.fail_aggregate.store(fail, Ordering::SeqCst);
    }

    fn answer(&self, call: &Call) -> Result<Vec<u8>, ChainError> {
        let pool = self
            .pools
            .get(&call.target)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ChainError::Rpc(format!("execution reverted at {:#x}", call.target)))?;

        let selector = call.call_data.as_slice();
        let tokens = if selector == abi::encode_get_reserves().as_slice() {
            vec![Token::Uint(pool.reserves.0), Token::Uint(pool.reserves.1)]
        } else if selector == abi::encode_get_fictive_reserves().as_slice() {
            vec![
                Token::Uint(pool.fictive_reserves.0),
                Token::Uint(pool.fictive_reserves.1),
            ]
        } else if selector == abi::encode_get_price_average().as_slice() {
            vec![
                Token::Uint(pool.price_average.0),
                Token::Uint(pool.price_average.1),
                Token::Uint(Uint::from(pool.price_average_timestamp)),
            ]
        } else if selector == abi::encode_get_pair_fees().as_slice() {
            vec![
                Token::Uint(Uint::from(pool.fees.fees_lp)),
                Token::Uint(Uint::from(pool.fees.fees_pool)),
            ]
        } else {
            return Err(ChainError::Rpc("unknown selector".to_string()));
        };

        Ok(ethabi::encode(&tokens))
    }
}

fn ordered(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn get_pair(
        &self,
        _factory: Address,
        token0: Address,
        token1: Address,
    ) -> Result<Address, ChainError> {
        self.get_pair_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_get_pair.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc("connection refused".to_string()));
        }
        Ok(self
            .pairs
            .get(&ordered(token0, token1))
            .map(|entry| *entry.value())
            .unwrap_or_else(Address::zero))
    }

    async fn aggregate(&self, calls: Vec<Call>, _block: u64) -> Result<Vec<Vec<u8>>, ChainError> {
        self.aggregate_calls.fetch_add(1, Ordering::SeqCst);
        self.last_batch_size.store(calls.len(), Ordering::SeqCst);
        if self.fail_aggregate.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc("connection refused".to_string()));
        }

        let mut results = calls
            .iter()
            .map(|call| self.answer(call))
            .collect::<Result<Vec<_>, _>>()?;

        let dropped = self.dropped_results.load(Ordering::SeqCst);
        results.truncate(results.len().saturating_sub(dropped));
        Ok(results)
    }
}
