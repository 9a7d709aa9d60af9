//! Reasons a quote cannot be produced

use smardex_amm::{Address, MathError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    #[error("Source and destination token are the same")]
    DegeneratePair,

    #[error("Pool {pool_identifier} is not in the allowed pool list")]
    FilteredOut { pool_identifier: String },

    #[error("No pool for {from:#x} / {to:#x}")]
    NoRoute { from: Address, to: Address },

    #[error("No snapshot of pool {pool:#x} for block {block}")]
    StaleOrMissingSnapshot { pool: Address, block: u64 },

    #[error("Pool {pool:#x} is already synced at block {cached_block}, past block {block}")]
    Superseded {
        pool: Address,
        block: u64,
        cached_block: u64,
    },

    #[error("Unit amount for {decimals} decimals does not fit in 256 bits")]
    InvalidDecimals { decimals: u8 },

    #[error("Unit amount cannot be quoted: {0}")]
    UnitQuote(MathError),
}
