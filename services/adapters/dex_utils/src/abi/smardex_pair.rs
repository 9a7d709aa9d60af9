//! SmarDex pair ABIs
//!
//! Only the view functions needed to rebuild a pool snapshot are defined.

use super::{decode_output, param, safe_u256_to_u128, uint_at, view_function, DecodingError};
use ethabi::{Function, ParamType, Uint};
use smardex_amm::PoolFees;

/// Real token balances held by the pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reserves {
    pub reserve0: Uint,
    pub reserve1: Uint,
}

/// Stored price average and the timestamp it was last written at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceAverage {
    pub price_average0: Uint,
    pub price_average1: Uint,
    pub last_timestamp: Uint,
}

/// function getReserves() view returns (uint256 reserve0_, uint256 reserve1_)
pub fn get_reserves_function() -> Function {
    view_function(
        "getReserves",
        vec![],
        vec![
            param("reserve0_", ParamType::Uint(256)),
            param("reserve1_", ParamType::Uint(256)),
        ],
    )
}

/// function getFictiveReserves() view returns (uint256 fictiveReserve0_, uint256 fictiveReserve1_)
pub fn get_fictive_reserves_function() -> Function {
    view_function(
        "getFictiveReserves",
        vec![],
        vec![
            param("fictiveReserve0_", ParamType::Uint(256)),
            param("fictiveReserve1_", ParamType::Uint(256)),
        ],
    )
}

/// function getPriceAverage() view returns (uint256 priceAverage0_, uint256 priceAverage1_, uint256 priceAverageLastTimestamp_)
pub fn get_price_average_function() -> Function {
    view_function(
        "getPriceAverage",
        vec![],
        vec![
            param("priceAverage0_", ParamType::Uint(256)),
            param("priceAverage1_", ParamType::Uint(256)),
            param("priceAverageLastTimestamp_", ParamType::Uint(256)),
        ],
    )
}

/// function getPairFees() view returns (uint128 feesLP_, uint128 feesPool_)
pub fn get_pair_fees_function() -> Function {
    view_function(
        "getPairFees",
        vec![],
        vec![
            param("feesLP_", ParamType::Uint(128)),
            param("feesPool_", ParamType::Uint(128)),
        ],
    )
}

pub fn encode_get_reserves() -> Vec<u8> {
    get_reserves_function().short_signature().to_vec()
}

pub fn encode_get_fictive_reserves() -> Vec<u8> {
    get_fictive_reserves_function().short_signature().to_vec()
}

pub fn encode_get_price_average() -> Vec<u8> {
    get_price_average_function().short_signature().to_vec()
}

pub fn encode_get_pair_fees() -> Vec<u8> {
    get_pair_fees_function().short_signature().to_vec()
}

pub fn decode_reserves(data: &[u8]) -> Result<Reserves, DecodingError> {
    let tokens = decode_output(&get_reserves_function(), data)?;
    Ok(Reserves {
        reserve0: uint_at(&tokens, 0, "reserve0_")?,
        reserve1: uint_at(&tokens, 1, "reserve1_")?,
    })
}

/// Fictive reserves share the shape of real reserves
pub fn decode_fictive_reserves(data: &[u8]) -> Result<Reserves, DecodingError> {
    let tokens = decode_output(&get_fictive_reserves_function(), data)?;
    Ok(Reserves {
        reserve0: uint_at(&tokens, 0, "fictiveReserve0_")?,
        reserve1: uint_at(&tokens, 1, "fictiveReserve1_")?,
    })
}

pub fn decode_price_average(data: &[u8]) -> Result<PriceAverage, DecodingError> {
    let tokens = decode_output(&get_price_average_function(), data)?;
    Ok(PriceAverage {
        price_average0: uint_at(&tokens, 0, "priceAverage0_")?,
        price_average1: uint_at(&tokens, 1, "priceAverage1_")?,
        last_timestamp: uint_at(&tokens, 2, "priceAverageLastTimestamp_")?,
    })
}

pub fn decode_pair_fees(data: &[u8]) -> Result<PoolFees, DecodingError> {
    let tokens = decode_output(&get_pair_fees_function(), data)?;
    Ok(PoolFees::new(
        safe_u256_to_u128(uint_at(&tokens, 0, "feesLP_")?)?,
        safe_u256_to_u128(uint_at(&tokens, 1, "feesPool_")?)?,
    ))
}
