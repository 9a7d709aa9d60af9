//! Token pair to pool discovery with process-lifetime memoization
//!
//! Pairs are canonicalized (numerically smaller address first) before every
//! lookup, so `resolve(A, B)` and `resolve(B, A)` share one entry. Negative
//! answers ("the factory has no pool") are cached as well; chain failures are
//! not, and the next call retries.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use smardex_amm::{Address, FeeMode, FeePolicy};
use smardex_dex::ChainReader;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Unordered token pair stored in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenPair {
    pub token0: Address,
    pub token1: Address,
}

impl TokenPair {
    /// `None` when both tokens are the same
    pub fn new(token_a: Address, token_b: Address) -> Option<Self> {
        if token_a == token_b {
            return None;
        }
        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Some(Self { token0, token1 })
    }

    pub fn contains(&self, token: &Address) -> bool {
        self.token0 == *token || self.token1 == *token
    }

    /// True when `token` is the pair's token0
    pub fn is_token0(&self, token: &Address) -> bool {
        self.token0 == *token
    }
}

/// Pool serving a pair, with its fee mode fixed at discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredPool {
    pub address: Address,
    pub fee_mode: FeeMode,
}

/// Registry entry: `pool` is `None` when the factory confirmed no pool exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub token0: Address,
    pub token1: Address,
    pub pool: Option<DiscoveredPool>,
}

pub struct PairRegistry {
    dex_key: String,
    factory: Address,
    fee_policy: FeePolicy,
    reader: Arc<dyn ChainReader>,
    pairs: DashMap<TokenPair, Option<DiscoveredPool>>,
}

impl PairRegistry {
    pub fn new(
        dex_key: impl Into<String>,
        factory: Address,
        fee_policy: FeePolicy,
        reader: Arc<dyn ChainReader>,
    ) -> Self {
        Self {
            dex_key: dex_key.into(),
            factory,
            fee_policy,
            reader,
            pairs: DashMap::new(),
        }
    }

    /// Pool for the pair, discovering it through the factory on first use
    pub async fn resolve(&self, token_a: Address, token_b: Address) -> Option<DiscoveredPool> {
        let pair = TokenPair::new(token_a, token_b)?;

        if let Some(entry) = self.pairs.get(&pair) {
            debug!(
                token0 = %format!("{:#x}", pair.token0),
                token1 = %format!("{:#x}", pair.token1),
                "Pair registry hit"
            );
            return *entry.value();
        }

        let address = match self
            .reader
            .get_pair(self.factory, pair.token0, pair.token1)
            .await
        {
            Ok(address) => address,
            Err(e) => {
                warn!(
                    token0 = %format!("{:#x}", pair.token0),
                    token1 = %format!("{:#x}", pair.token1),
                    error = %e,
                    "Pair lookup failed"
                );
                return None;
            }
        };

        let pool = if address.is_zero() {
            None
        } else {
            Some(DiscoveredPool {
                address,
                fee_mode: self.fee_policy.mode_for(&address),
            })
        };

        // a concurrent caller may have won the race; keep its entry
        let stored = *self.pairs.entry(pair).or_insert(pool).value();
        match stored {
            Some(pool) => info!(
                pool = %format!("{:#x}", pool.address),
                legacy = pool.fee_mode.is_legacy(),
                "Discovered pool"
            ),
            None => debug!(
                token0 = %format!("{:#x}", pair.token0),
                token1 = %format!("{:#x}", pair.token1),
                "No pool for pair"
            ),
        }
        stored
    }

    /// Cached answer without chain access; `None` when never queried
    pub fn cached(&self, token_a: Address, token_b: Address) -> Option<Option<DiscoveredPool>> {
        let pair = TokenPair::new(token_a, token_b)?;
        self.pairs.get(&pair).map(|entry| *entry.value())
    }

    /// Discovered pairs (with a pool) that contain `token`
    pub fn pairs_with_token(&self, token: &Address) -> Vec<Pair> {
        let mut pairs: Vec<Pair> = self
            .pairs
            .iter()
            .filter(|entry| entry.key().contains(token))
            .filter_map(|entry| {
                entry.value().map(|pool| Pair {
                    token0: entry.key().token0,
                    token1: entry.key().token1,
                    pool: Some(pool),
                })
            })
            .collect();
        pairs.sort_by_key(|pair| (pair.token0, pair.token1));
        pairs
    }

    /// `"<dex_key>_<token0>_<token1>"` with the key as configured and
    /// lower-case hex addresses in canonical order
    pub fn pool_identifier(&self, token_a: Address, token_b: Address) -> Option<String> {
        let pair = TokenPair::new(token_a, token_b)?;
        Some(format!(
            "{}_{:#x}_{:#x}",
            self.dex_key, pair.token0, pair.token1
        ))
    }

    pub fn dex_key(&self) -> &str {
        &self.dex_key
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
