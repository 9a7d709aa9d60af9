//! SmarDex factory ABI

use super::{decode_output, param, view_function, DecodingError};
use ethabi::{Address, Function, ParamType, Token};

/// function getPair(address tokenA, address tokenB) view returns (address pair)
pub fn get_pair_function() -> Function {
    view_function(
        "getPair",
        vec![
            param("tokenA", ParamType::Address),
            param("tokenB", ParamType::Address),
        ],
        vec![param("pair", ParamType::Address)],
    )
}

pub fn encode_get_pair(token0: Address, token1: Address) -> Result<Vec<u8>, DecodingError> {
    get_pair_function()
        .encode_input(&[Token::Address(token0), Token::Address(token1)])
        .map_err(|e| DecodingError::AbiEncodingError(e.to_string()))
}

/// Pair address; the zero address means the factory has no pool for the tokens
pub fn decode_get_pair(data: &[u8]) -> Result<Address, DecodingError> {
    decode_output(&get_pair_function(), data)?
        .into_iter()
        .next()
        .and_then(Token::into_address)
        .ok_or_else(|| DecodingError::MissingField("pair".to_string()))
}
