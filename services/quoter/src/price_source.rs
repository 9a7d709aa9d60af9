//! # SmarDex Price Source
//!
//! ## Purpose
//!
//! Turns a quote request into a price curve for the single SmarDex pool of a
//! token pair. Discovery, state refresh and math live in other crates; this
//! module sequences them and folds every failure into "no quote".
//!
//! ## Flow
//!
//! ```text
//! QuoteRequest ─→ PairRegistry::resolve ─→ BatchSynchronizer::ensure_fresh
//!                                                   │
//!              PoolPrices ←─ quote_sell/quote_buy ←─ PoolStateCache::get
//! ```

use crate::clock::Clock;
use crate::error::QuoteError;
use crate::types::{PoolPrices, QuoteRequest, Token};
use async_trait::async_trait;
use futures::future::join_all;
use smardex_amm::{Address, PoolSnapshot, SwapSide, U256};
use smardex_config::NetworkConfig;
use smardex_dex::ChainReader;
use smardex_state::{
    BatchSynchronizer, DiscoveredPool, PairRegistry, PoolStateCache, SyncError, SyncReport,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Pull-based price capability for one DEX
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Pool for the token pair, if one exists
    async fn resolve(&self, from: &Token, to: &Token) -> Option<DiscoveredPool>;

    /// Make sure every pool has a snapshot for `block_number`
    async fn ensure_fresh(
        &self,
        pools: &[DiscoveredPool],
        block_number: u64,
    ) -> Result<SyncReport, SyncError>;

    /// Price curve for the request, `None` when the pair cannot be priced
    async fn quote(&self, request: &QuoteRequest) -> Option<PoolPrices>;
}

pub struct SmardexPriceSource {
    registry: PairRegistry,
    synchronizer: BatchSynchronizer,
    cache: Arc<PoolStateCache>,
    clock: Arc<dyn Clock>,
    gas_cost: u64,
}

impl SmardexPriceSource {
    pub fn new(
        registry: PairRegistry,
        synchronizer: BatchSynchronizer,
        clock: Arc<dyn Clock>,
        gas_cost: u64,
    ) -> Self {
        let cache = synchronizer.cache().clone();
        Self {
            registry,
            synchronizer,
            cache,
            clock,
            gas_cost,
        }
    }

    /// Wire registry, synchronizer and cache for one configured network
    pub fn from_network(
        network: &NetworkConfig,
        reader: Arc<dyn ChainReader>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = Arc::new(PoolStateCache::new());
        let registry = PairRegistry::new(
            network.dex_key.clone(),
            network.factory_address,
            network.fee_policy(),
            reader.clone(),
        );
        let synchronizer = BatchSynchronizer::new(reader, cache);
        Self::new(registry, synchronizer, clock, network.gas_cost)
    }

    pub fn registry(&self) -> &PairRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<PoolStateCache> {
        &self.cache
    }

    pub fn gas_cost(&self) -> u64 {
        self.gas_cost
    }

    /// Identifiers of the pools that can serve `from -> to`.
    ///
    /// A pair maps to at most one pool, so this is empty or a single entry.
    pub fn pool_identifiers(&self, from: &Token, to: &Token) -> Vec<String> {
        self.registry
            .pool_identifier(from.address, to.address)
            .into_iter()
            .collect()
    }

    /// Resolve many pairs concurrently, then refresh all found pools in one batch
    pub async fn catch_up(
        &self,
        pairs: &[(Address, Address)],
        block_number: u64,
    ) -> Result<SyncReport, SyncError> {
        let lookups = pairs
            .iter()
            .map(|(token_a, token_b)| self.registry.resolve(*token_a, *token_b));
        let pools: Vec<DiscoveredPool> = join_all(lookups).await.into_iter().flatten().collect();

        debug!(
            pairs = pairs.len(),
            pools = pools.len(),
            block = block_number,
            "Catching up pairs"
        );
        self.synchronizer.ensure_fresh(&pools, block_number).await
    }

    /// Like [`PriceSource::quote`] but keeps the reason a quote was refused
    pub async fn try_quote(&self, request: &QuoteRequest) -> Result<PoolPrices, QuoteError> {
        let from = request.from.address;
        let to = request.to.address;

        let pool_identifier = self
            .registry
            .pool_identifier(from, to)
            .ok_or(QuoteError::DegeneratePair)?;

        if let Some(allowed) = &request.limit_pools {
            if !allowed.iter().any(|id| id.eq_ignore_ascii_case(&pool_identifier)) {
                return Err(QuoteError::FilteredOut { pool_identifier });
            }
        }

        let pool = self
            .registry
            .resolve(from, to)
            .await
            .ok_or(QuoteError::NoRoute { from, to })?;

        if let Err(e) = self
            .synchronizer
            .ensure_fresh(&[pool], request.block_number)
            .await
        {
            warn!(
                pool = %format!("{:#x}", pool.address),
                block = request.block_number,
                error = %e,
                "Pool state refresh failed"
            );
        }

        let snapshot = match self.cache.get(&pool.address, request.block_number) {
            Some(snapshot) => snapshot,
            None => return Err(self.missing_snapshot(pool.address, request.block_number)),
        };

        let zero_for_one = from < to;
        let now = self.clock.now();

        let unit_token = request.unit_token();
        let unit_amount = unit_token.unit().ok_or(QuoteError::InvalidDecimals {
            decimals: unit_token.decimals,
        })?;
        let unit = snapshot
            .quote(request.side, zero_for_one, unit_amount, now)
            .map_err(QuoteError::UnitQuote)?;

        let prices = request
            .amounts
            .iter()
            .map(|amount| price_one(&snapshot, request.side, zero_for_one, *amount, now))
            .collect();

        Ok(PoolPrices {
            pool_identifier,
            pool_address: pool.address,
            prices,
            unit,
            zero_for_one,
            gas_cost: self.gas_cost,
        })
    }

    fn missing_snapshot(&self, pool: Address, block: u64) -> QuoteError {
        if let Some(cached) = self.cache.latest(&pool).filter(|c| c.as_of_block > block) {
            debug!(
                pool = %format!("{:#x}", pool),
                block,
                cached_block = cached.as_of_block,
                "Pool state already past requested block"
            );
            return QuoteError::Superseded {
                pool,
                block,
                cached_block: cached.as_of_block,
            };
        }
        error!(
            pool = %format!("{:#x}", pool),
            block,
            "No pool state for requested block"
        );
        QuoteError::StaleOrMissingSnapshot { pool, block }
    }
}

fn price_one(
    snapshot: &PoolSnapshot,
    side: SwapSide,
    zero_for_one: bool,
    amount: U256,
    now: u64,
) -> Option<U256> {
    if amount.is_zero() {
        return Some(U256::zero());
    }
    match snapshot.quote(side, zero_for_one, amount, now) {
        Ok(price) => Some(price),
        Err(e) => {
            debug!(amount = %amount, error = %e, "Amount cannot be priced");
            None
        }
    }
}

#[async_trait]
impl PriceSource for SmardexPriceSource {
    async fn resolve(&self, from: &Token, to: &Token) -> Option<DiscoveredPool> {
        self.registry.resolve(from.address, to.address).await
    }

    async fn ensure_fresh(
        &self,
        pools: &[DiscoveredPool],
        block_number: u64,
    ) -> Result<SyncReport, SyncError> {
        self.synchronizer.ensure_fresh(pools, block_number).await
    }

    async fn quote(&self, request: &QuoteRequest) -> Option<PoolPrices> {
        match self.try_quote(request).await {
            Ok(prices) => Some(prices),
            Err(e) => {
                debug!(
                    from = %format!("{:#x}", request.from.address),
                    to = %format!("{:#x}", request.to.address),
                    reason = %e,
                    "No quote"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smardex_amm::PoolFees;

    fn snapshot(fees: PoolFees) -> PoolSnapshot {
        let r = U256::from(1_000_000u64);
        PoolSnapshot {
            reserve0: r,
            reserve1: r,
            fictive_reserve0: r,
            fictive_reserve1: r,
            price_average0: r,
            price_average1: r,
            price_average_timestamp: 100,
            fees,
        }
    }

    #[test]
    fn test_zero_amount_prices_to_zero() {
        let s = snapshot(PoolFees::ZERO);
        assert_eq!(
            price_one(&s, SwapSide::Sell, true, U256::zero(), 100),
            Some(U256::zero())
        );
    }

    #[test]
    fn test_unpriceable_amount_is_none() {
        let s = snapshot(PoolFees::ZERO);
        // more than the whole reserve can never be bought
        assert_eq!(
            price_one(&s, SwapSide::Buy, true, U256::from(2_000_000u64), 100),
            None
        );
        assert_eq!(
            price_one(&s, SwapSide::Sell, true, U256::from(1_000u64), 100),
            Some(U256::from(998u64))
        );
    }
}
