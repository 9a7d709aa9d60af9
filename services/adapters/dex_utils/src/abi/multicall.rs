//! Multicall `aggregate` ABI
//!
//! Every sub-call must succeed for `aggregate` to return, so the result list
//! always has one entry per request when the call itself succeeds.

use super::{decode_output, param, uint_at, view_function, DecodingError};
use ethabi::{Address, Function, ParamType, Token, Uint};

/// One read bundled into an aggregate call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub target: Address,
    pub call_data: Vec<u8>,
}

impl Call {
    pub fn new(target: Address, call_data: Vec<u8>) -> Self {
        Self { target, call_data }
    }
}

/// function aggregate((address target, bytes callData)[] calls) returns (uint256 blockNumber, bytes[] returnData)
pub fn aggregate_function() -> Function {
    view_function(
        "aggregate",
        vec![param(
            "calls",
            ParamType::Array(Box::new(ParamType::Tuple(vec![
                ParamType::Address,
                ParamType::Bytes,
            ]))),
        )],
        vec![
            param("blockNumber", ParamType::Uint(256)),
            param("returnData", ParamType::Array(Box::new(ParamType::Bytes))),
        ],
    )
}

pub fn encode_aggregate(calls: &[Call]) -> Result<Vec<u8>, DecodingError> {
    let calls = calls
        .iter()
        .map(|call| {
            Token::Tuple(vec![
                Token::Address(call.target),
                Token::Bytes(call.call_data.clone()),
            ])
        })
        .collect();

    aggregate_function()
        .encode_input(&[Token::Array(calls)])
        .map_err(|e| DecodingError::AbiEncodingError(e.to_string()))
}

/// Block the calls ran at and the raw return data of each, in request order
pub fn decode_aggregate(data: &[u8]) -> Result<(Uint, Vec<Vec<u8>>), DecodingError> {
    let tokens = decode_output(&aggregate_function(), data)?;
    let block_number = uint_at(&tokens, 0, "blockNumber")?;

    let return_data = tokens
        .get(1)
        .cloned()
        .and_then(Token::into_array)
        .ok_or_else(|| DecodingError::MissingField("returnData".to_string()))?
        .into_iter()
        .map(|token| {
            token
                .into_bytes()
                .ok_or_else(|| DecodingError::MissingField("returnData[]".to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((block_number, return_data))
}
