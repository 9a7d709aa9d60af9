//! Integration tests for the SmarDex ABI library
//!
//! Tests call encoding and output decoding with realistic payloads and edge cases

use ethabi::{Token, Uint};
use smardex_dex::abi::*;
use smardex_dex::abi::{factory, multicall, smardex_pair};
use smardex_dex::ChainError;

/// Create H160 from hex string (for addresses)
fn h160_from_hex(hex: &str) -> ethabi::Address {
    let bytes = hex::decode(hex.trim_start_matches("0x")).unwrap();
    let mut result = [0u8; 20];
    result[20 - bytes.len()..].copy_from_slice(&bytes);
    ethabi::Address::from(result)
}

/// ABI-encode a tuple of unsigned integers the way a contract returns them
fn encode_uints(values: &[u128]) -> Vec<u8> {
    let tokens: Vec<Token> = values.iter().map(|v| Token::Uint(Uint::from(*v))).collect();
    ethabi::encode(&tokens)
}

#[test]
fn test_well_known_selectors() {
    // getReserves() shares its selector with every Uniswap V2 style pair
    assert_eq!(hex::encode(encode_get_reserves()), "0902f1ac");
    // getPair(address,address)
    let call = encode_get_pair(
        h160_from_hex("0x1111111111111111111111111111111111111111"),
        h160_from_hex("0x2222222222222222222222222222222222222222"),
    )
    .unwrap();
    assert_eq!(hex::encode(&call[..4]), "e6a43905");
    assert_eq!(call.len(), 4 + 32 * 2);
    // aggregate((address,bytes)[])
    let aggregate = encode_aggregate(&[]).unwrap();
    assert_eq!(hex::encode(&aggregate[..4]), "252dba42");
}

#[test]
fn test_pair_selectors_are_distinct() {
    let selectors = [
        encode_get_reserves(),
        encode_get_fictive_reserves(),
        encode_get_price_average(),
        encode_get_pair_fees(),
    ];
    for (i, a) in selectors.iter().enumerate() {
        assert_eq!(a.len(), 4);
        for b in &selectors[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_decode_reserves() {
    let data = encode_uints(&[1_000_000, 2_000_000]);
    let reserves = decode_reserves(&data).unwrap();

    assert_eq!(reserves.reserve0, Uint::from(1_000_000u64));
    assert_eq!(reserves.reserve1, Uint::from(2_000_000u64));
}

#[test]
fn test_decode_full_width_values() {
    // Reserves above u128 must survive decoding untouched
    let big = Uint::MAX - Uint::from(7u64);
    let data = ethabi::encode(&[Token::Uint(big), Token::Uint(Uint::one())]);

    let fictive = decode_fictive_reserves(&data).unwrap();
    assert_eq!(fictive.reserve0, big);
    assert_eq!(fictive.reserve1, Uint::one());
}

#[test]
fn test_decode_price_average() {
    let data = encode_uints(&[500, 700, 1_700_000_000]);
    let average = decode_price_average(&data).unwrap();

    assert_eq!(average.price_average0, Uint::from(500u64));
    assert_eq!(average.price_average1, Uint::from(700u64));
    assert_eq!(average.last_timestamp, Uint::from(1_700_000_000u64));
}

#[test]
fn test_decode_pair_fees() {
    let data = encode_uints(&[700, 300]);
    let fees = decode_pair_fees(&data).unwrap();

    assert_eq!(fees.fees_lp, 700);
    assert_eq!(fees.fees_pool, 300);
}

#[test]
fn test_decode_pair_fees_overflow() {
    let data = ethabi::encode(&[Token::Uint(Uint::MAX), Token::Uint(Uint::zero())]);
    let result = decode_pair_fees(&data);

    assert!(matches!(result, Err(DecodingError::ValueOverflow { .. })));
}

#[test]
fn test_truncated_output_is_rejected() {
    let data = encode_uints(&[1, 2]);

    assert!(matches!(
        decode_reserves(&data[..40]),
        Err(DecodingError::AbiParsingError(_))
    ));
    // price average expects three words
    assert!(decode_price_average(&data).is_err());
}

#[test]
fn test_decode_get_pair() {
    let pair = h160_from_hex("0x3333333333333333333333333333333333333333");
    let data = ethabi::encode(&[Token::Address(pair)]);
    assert_eq!(decode_get_pair(&data).unwrap(), pair);

    let none = ethabi::encode(&[Token::Address(ethabi::Address::zero())]);
    assert!(decode_get_pair(&none).unwrap().is_zero());
}

#[test]
fn test_aggregate_encoding_carries_every_call() {
    let pool = h160_from_hex("0x4444444444444444444444444444444444444444");
    let calls = vec![
        Call::new(pool, encode_get_reserves()),
        Call::new(pool, encode_get_fictive_reserves()),
        Call::new(pool, encode_get_price_average()),
    ];

    let encoded = encode_aggregate(&calls).unwrap();
    let decoded = multicall::aggregate_function()
        .decode_input(&encoded[4..])
        .unwrap();

    let entries = decoded[0].clone().into_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries[1],
        Token::Tuple(vec![
            Token::Address(pool),
            Token::Bytes(encode_get_fictive_reserves())
        ])
    );
}

#[test]
fn test_decode_aggregate_preserves_order() {
    let results = vec![encode_uints(&[1, 2]), encode_uints(&[3, 4]), vec![]];
    let data = ethabi::encode(&[
        Token::Uint(Uint::from(19_000_000u64)),
        Token::Array(results.iter().cloned().map(Token::Bytes).collect()),
    ]);

    let (block, decoded) = decode_aggregate(&data).unwrap();
    assert_eq!(block, Uint::from(19_000_000u64));
    assert_eq!(decoded, results);

    let second = decode_reserves(&decoded[1]).unwrap();
    assert_eq!(second.reserve0, Uint::from(3u64));
}

#[test]
fn test_function_shapes() {
    let fees = smardex_pair::get_pair_fees_function();
    assert_eq!(fees.name, "getPairFees");
    assert_eq!(fees.outputs.len(), 2);

    let get_pair = factory::get_pair_function();
    assert_eq!(get_pair.inputs.len(), 2);
    assert_eq!(get_pair.outputs.len(), 1);
}

#[test]
fn test_decoding_error_converts_to_chain_error() {
    let err: ChainError = DecodingError::MissingField("pair".to_string()).into();
    assert!(err.to_string().contains("pair"));
}
