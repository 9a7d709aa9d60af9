//! Request and response types for quoting

use serde::{Deserialize, Serialize, Serializer};
use smardex_amm::{Address, SwapSide, U256};

/// Token identity plus the decimals that define its unit amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub decimals: u8,
}

impl Token {
    pub fn new(address: Address, decimals: u8) -> Self {
        Self { address, decimals }
    }

    /// `10^decimals`, or `None` when it does not fit in 256 bits
    pub fn unit(&self) -> Option<U256> {
        U256::from(10u64).checked_pow(U256::from(self.decimals))
    }
}

/// Price curve request for one token pair at one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub from: Token,
    pub to: Token,
    pub side: SwapSide,
    /// Inputs for sells, desired outputs for buys
    pub amounts: Vec<U256>,
    pub block_number: u64,
    /// Only quote pools whose identifier is listed
    pub limit_pools: Option<Vec<String>>,
}

impl QuoteRequest {
    pub fn new(from: Token, to: Token, side: SwapSide, amounts: Vec<U256>, block_number: u64) -> Self {
        Self {
            from,
            to,
            side,
            amounts,
            block_number,
            limit_pools: None,
        }
    }

    pub fn with_limit_pools(mut self, limit_pools: Vec<String>) -> Self {
        self.limit_pools = Some(limit_pools);
        self
    }

    /// Token whose decimals define the unit amount
    pub fn unit_token(&self) -> &Token {
        if self.side.is_sell() {
            &self.from
        } else {
            &self.to
        }
    }
}

/// Quoted price curve; `prices[i]` answers `amounts[i]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolPrices {
    pub pool_identifier: String,
    pub pool_address: Address,
    #[serde(serialize_with = "serialize_optional_amounts")]
    pub prices: Vec<Option<U256>>,
    #[serde(serialize_with = "serialize_amount")]
    pub unit: U256,
    /// True when the source token is the pool's token0
    pub zero_for_one: bool,
    pub gas_cost: u64,
}

fn serialize_amount<S: Serializer>(amount: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&amount.to_string())
}

fn serialize_optional_amounts<S: Serializer>(
    amounts: &[Option<U256>],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(amounts.iter().map(|amount| amount.map(|a| a.to_string())))
}
