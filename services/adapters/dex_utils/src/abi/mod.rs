//! ABI definitions and call decoding for SmarDex contracts
//!
//! This module provides:
//! - Canonical function ABIs for the pair, factory and Multicall contracts
//! - Call-data encoders for every read the synchronizer issues
//! - Type-safe decoders for the fixed-shape integer tuples they return
//!
//! # Supported Contracts
//! - SmarDex pair (`getReserves`, `getFictiveReserves`, `getPriceAverage`, `getPairFees`)
//! - SmarDex factory (`getPair`)
//! - Multicall (`aggregate`)

pub mod factory;
pub mod multicall;
pub mod smardex_pair;

use ethabi::{Function, Param, ParamType, StateMutability, Token};

/// Error types for ABI encoding and decoding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodingError {
    #[error("ABI parsing failed: {0}")]
    AbiParsingError(String),

    #[error("ABI encoding failed: {0}")]
    AbiEncodingError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Value overflow: {value} exceeds u128::MAX")]
    ValueOverflow { value: String },
}

// Re-export main components
pub use factory::{decode_get_pair, encode_get_pair};
pub use multicall::{decode_aggregate, encode_aggregate, Call};
pub use smardex_pair::{
    decode_fictive_reserves, decode_pair_fees, decode_price_average, decode_reserves,
    encode_get_fictive_reserves, encode_get_pair_fees, encode_get_price_average,
    encode_get_reserves, PriceAverage, Reserves,
};

fn param(name: &str, kind: ParamType) -> Param {
    Param {
        name: name.to_string(),
        kind,
        internal_type: None,
    }
}

/// View function with the given inputs and outputs
#[allow(deprecated)]
fn view_function(name: &str, inputs: Vec<Param>, outputs: Vec<Param>) -> Function {
    Function {
        name: name.to_string(),
        inputs,
        outputs,
        constant: None,
        state_mutability: StateMutability::View,
    }
}

/// Take the unsigned integer at `index` from decoded output
fn uint_at(tokens: &[Token], index: usize, field: &str) -> Result<ethabi::Uint, DecodingError> {
    tokens
        .get(index)
        .cloned()
        .and_then(Token::into_uint)
        .ok_or_else(|| DecodingError::MissingField(field.to_string()))
}

fn decode_output(function: &Function, data: &[u8]) -> Result<Vec<Token>, DecodingError> {
    function
        .decode_output(data)
        .map_err(|e| DecodingError::AbiParsingError(format!("{}: {}", function.name, e)))
}

/// Safely convert U256 to u128 with overflow detection
pub fn safe_u256_to_u128(value: ethabi::Uint) -> Result<u128, DecodingError> {
    if value > ethabi::Uint::from(u128::MAX) {
        return Err(DecodingError::ValueOverflow {
            value: format!("{}", value),
        });
    }
    Ok(value.as_u128())
}
