//! Pool snapshot model and quote direction

use crate::error::MathError;
use crate::fees::PoolFees;
use crate::smardex_math::{quote_buy, quote_sell};
use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

/// Direction of a quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapSide {
    /// Exact input, quote the output
    Sell,
    /// Exact output, quote the input
    Buy,
}

impl SwapSide {
    pub fn is_sell(&self) -> bool {
        matches!(self, SwapSide::Sell)
    }
}

/// On-chain state of one SmarDex pool at a single block.
///
/// Field order follows the pool contract: `getReserves()`,
/// `getFictiveReserves()`, `getPriceAverage()` and the fee pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub reserve0: U256,
    pub reserve1: U256,
    pub fictive_reserve0: U256,
    pub fictive_reserve1: U256,
    pub price_average0: U256,
    pub price_average1: U256,
    pub price_average_timestamp: u64,
    pub fees: PoolFees,
}

impl PoolSnapshot {
    /// Quote `amount` on the given side. For sells `amount` is the input,
    /// for buys it is the desired output.
    pub fn quote(
        &self,
        side: SwapSide,
        token0_in: bool,
        amount: U256,
        now: u64,
    ) -> Result<U256, MathError> {
        match side {
            SwapSide::Sell => quote_sell(self, token0_in, amount, now),
            SwapSide::Buy => quote_buy(self, token0_in, amount, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_helpers() {
        assert!(SwapSide::Sell.is_sell());
        assert!(!SwapSide::Buy.is_sell());
    }

    #[test]
    fn test_quote_dispatches_by_side() {
        let million = U256::from(1_000_000u64);
        let snapshot = PoolSnapshot {
            reserve0: million,
            reserve1: million,
            fictive_reserve0: million,
            fictive_reserve1: million,
            price_average0: million,
            price_average1: million,
            price_average_timestamp: 7,
            fees: PoolFees::ZERO,
        };

        assert_eq!(
            snapshot.quote(SwapSide::Sell, true, U256::from(1_000u64), 7),
            Ok(U256::from(998u64))
        );
        assert_eq!(
            snapshot.quote(SwapSide::Buy, true, U256::from(998u64), 7),
            Ok(U256::from(1_000u64))
        );
    }
}
